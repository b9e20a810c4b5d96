//! Speaker roles and their visual/voice profiles.
//!
//! Stages never compare speaker strings themselves: they ask the [`Cast`] for the
//! [`RoleProfile`] of a speaker and use its bubble style and voice.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use vello_cpu::kurbo::{Point, Rect};

/// Role a speaker plays in the conversation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpeakerRole {
    /// The designated speaker, drawn on the right.
    Featured,
    /// Everyone else.
    Default,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BubbleSide {
    Left,
    Right,
}

/// Straight-alpha RGBA8 color.
pub type Rgba = [u8; 4];

pub const BLACK: Rgba = [0, 0, 0, 255];
pub const WHITE: Rgba = [255, 255, 255, 255];

/// Distance between the bubble and the canvas edge.
const BUBBLE_MARGIN: f64 = 10.0;
/// Offset of the text origin from the bubble's top-left corner.
const TEXT_INSET: f64 = 20.0;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BubbleStyle {
    pub side: BubbleSide,
    pub fill: Rgba,
    pub outline: Rgba,
    pub outline_width: f64,
    pub text_color: Rgba,
}

/// Resolved bubble placement on a canvas.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BubbleGeometry {
    pub rect: Rect,
    /// Top-left corner of the text layout box.
    pub text_origin: Point,
}

impl BubbleStyle {
    /// Place the bubble on the half of a `width` x `height` canvas selected by `side`.
    pub fn geometry(&self, width: u32, height: u32) -> BubbleGeometry {
        let w = f64::from(width);
        let h = f64::from(height);
        let mid = (w / 2.0).round();
        let rect = match self.side {
            BubbleSide::Left => Rect::new(BUBBLE_MARGIN, BUBBLE_MARGIN, mid, h - BUBBLE_MARGIN),
            BubbleSide::Right => {
                Rect::new(mid, BUBBLE_MARGIN, w - BUBBLE_MARGIN, h - BUBBLE_MARGIN)
            }
        };
        BubbleGeometry {
            rect,
            text_origin: Point::new(rect.x0 + TEXT_INSET, rect.y0 + TEXT_INSET),
        }
    }
}

/// Everything a stage needs to know about a speaker's role.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoleProfile {
    pub bubble: BubbleStyle,
    /// Voice name handed to the speech tool (`espeak -v`).
    pub voice: String,
}

/// Role → profile lookup table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoleTable {
    pub featured: RoleProfile,
    pub default: RoleProfile,
}

impl RoleTable {
    pub fn get(&self, role: SpeakerRole) -> &RoleProfile {
        match role {
            SpeakerRole::Featured => &self.featured,
            SpeakerRole::Default => &self.default,
        }
    }
}

impl Default for RoleTable {
    fn default() -> Self {
        Self {
            featured: RoleProfile {
                bubble: BubbleStyle {
                    side: BubbleSide::Right,
                    fill: [0, 0, 255, 255],
                    outline: BLACK,
                    outline_width: 2.0,
                    text_color: WHITE,
                },
                voice: "en-us".to_string(),
            },
            default: RoleProfile {
                bubble: BubbleStyle {
                    side: BubbleSide::Left,
                    fill: [200, 200, 200, 255],
                    outline: BLACK,
                    outline_width: 2.0,
                    text_color: BLACK,
                },
                voice: "en-uk-rp".to_string(),
            },
        }
    }
}

/// Speaker names mapped to roles, plus the role table.
///
/// Name matching is case-insensitive. Speakers not listed play [`SpeakerRole::Default`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Cast {
    pub speakers: BTreeMap<String, SpeakerRole>,
    pub roles: RoleTable,
}

impl Default for Cast {
    fn default() -> Self {
        let mut speakers = BTreeMap::new();
        speakers.insert("zoe".to_string(), SpeakerRole::Featured);
        Self {
            speakers,
            roles: RoleTable::default(),
        }
    }
}

impl Cast {
    pub fn role_of(&self, speaker: &str) -> SpeakerRole {
        let wanted = speaker.to_lowercase();
        self.speakers
            .iter()
            .find(|(name, _)| name.to_lowercase() == wanted)
            .map(|(_, role)| *role)
            .unwrap_or(SpeakerRole::Default)
    }

    pub fn profile_of(&self, speaker: &str) -> &RoleProfile {
        self.roles.get(self.role_of(speaker))
    }
}
