// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 cigraph contributors

//! Image roles and image sets
//!
//! Steps usually name the *role* of their execution environment rather than
//! a concrete image. Roles are bound from an [`ImageSet`], which is seeded
//! from the artifact being regenerated so pinned versions survive.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::errors::CigraphError;

/// Named slot for a container image
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", try_from = "String")]
pub enum ImageRole {
    Buf,
    FetchTask,
    Git,
    Go,
    Img,
    Js,
    Sqlc,
    Util,
}

impl ImageRole {
    pub const ALL: [ImageRole; 8] = [
        Self::Buf,
        Self::FetchTask,
        Self::Git,
        Self::Go,
        Self::Img,
        Self::Js,
        Self::Sqlc,
        Self::Util,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Buf => "buf",
            Self::FetchTask => "fetch-task",
            Self::Git => "git",
            Self::Go => "go",
            Self::Img => "img",
            Self::Js => "js",
            Self::Sqlc => "sqlc",
            Self::Util => "util",
        }
    }
}

impl fmt::Display for ImageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ImageRole {
    type Err = CigraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|role| role.as_str() == s.to_lowercase())
            .ok_or_else(|| CigraphError::UnknownImageRole { role: s.to_string() })
    }
}

impl TryFrom<String> for ImageRole {
    type Error = CigraphError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Substring marker used to classify an image reference
#[derive(Debug, Clone, Copy)]
pub struct Marker {
    pub needle: &'static str,
    pub roles: &'static [ImageRole],
}

impl Marker {
    pub const fn new(needle: &'static str, roles: &'static [ImageRole]) -> Self {
        Self { needle, roles }
    }
}

/// Roles an image belongs to: the first marker contained in the image wins
pub fn classify<'m>(image: &str, markers: &'m [Marker]) -> &'m [ImageRole] {
    markers
        .iter()
        .find(|marker| image.contains(marker.needle))
        .map(|marker| marker.roles)
        .unwrap_or(&[])
}

/// Image reference per role
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageSet {
    images: BTreeMap<ImageRole, String>,
}

impl ImageSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from `(role, image)` pairs
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (ImageRole, S)>,
        S: Into<String>,
    {
        Self {
            images: pairs.into_iter().map(|(r, i)| (r, i.into())).collect(),
        }
    }

    /// Classify every image in order; later images override earlier ones
    pub fn classify_all<'a, I>(images: I, markers: &[Marker]) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut set = Self::new();
        for image in images {
            for role in classify(image, markers) {
                set.set(*role, image);
            }
        }
        set
    }

    pub fn get(&self, role: ImageRole) -> Option<&str> {
        self.images.get(&role).map(String::as_str)
    }

    pub fn set(&mut self, role: ImageRole, image: impl Into<String>) {
        self.images.insert(role, image.into());
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ImageRole, &str)> {
        self.images.iter().map(|(r, i)| (*r, i.as_str()))
    }

    /// Replace entries with the given pins
    pub fn override_with(&mut self, pins: &BTreeMap<ImageRole, String>) {
        for (role, image) in pins {
            self.images.insert(*role, image.clone());
        }
    }

    /// Fill roles that have no image yet from `defaults`
    pub fn fill_missing(&mut self, defaults: &ImageSet) {
        for (role, image) in &defaults.images {
            self.images.entry(*role).or_insert_with(|| image.clone());
        }
    }
}
