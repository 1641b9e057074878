//! Resolution: the time horizon a bar series belongs to.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Index, IndexMut};

/// One of the three bar series the analyzer tracks.
///
/// Macro is the long horizon that sets directional bias, Meso confirms it,
/// Micro is where entries are searched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resolution {
    Macro,
    Meso,
    Micro,
}

impl Resolution {
    /// All resolutions, top-down.
    pub const ALL: [Resolution; 3] = [Resolution::Macro, Resolution::Meso, Resolution::Micro];

    pub fn as_str(&self) -> &'static str {
        match self {
            Resolution::Macro => "macro",
            Resolution::Meso => "meso",
            Resolution::Micro => "micro",
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A value held once per resolution, indexed by [`Resolution`].
///
/// Serializes as a table with `macro`, `meso` and `micro` keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerResolution<T> {
    #[serde(rename = "macro")]
    pub macro_tf: T,
    #[serde(rename = "meso")]
    pub meso_tf: T,
    #[serde(rename = "micro")]
    pub micro_tf: T,
}

impl<T> PerResolution<T> {
    pub fn new(macro_tf: T, meso_tf: T, micro_tf: T) -> Self {
        Self {
            macro_tf,
            meso_tf,
            micro_tf,
        }
    }

    /// Build each slot from its resolution.
    pub fn from_fn(mut f: impl FnMut(Resolution) -> T) -> Self {
        Self {
            macro_tf: f(Resolution::Macro),
            meso_tf: f(Resolution::Meso),
            micro_tf: f(Resolution::Micro),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Resolution, &T)> {
        Resolution::ALL.into_iter().map(move |r| (r, &self[r]))
    }
}

impl<T> Index<Resolution> for PerResolution<T> {
    type Output = T;

    fn index(&self, resolution: Resolution) -> &T {
        match resolution {
            Resolution::Macro => &self.macro_tf,
            Resolution::Meso => &self.meso_tf,
            Resolution::Micro => &self.micro_tf,
        }
    }
}

impl<T> IndexMut<Resolution> for PerResolution<T> {
    fn index_mut(&mut self, resolution: Resolution) -> &mut T {
        match resolution {
            Resolution::Macro => &mut self.macro_tf,
            Resolution::Meso => &mut self.meso_tf,
            Resolution::Micro => &mut self.micro_tf,
        }
    }
}
