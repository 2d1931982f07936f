//! `.skin` files: `meshname,texturename` per line.

use std::fs;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

use log::trace;

use crate::error::{Md3Error, Result};
use crate::texture::Md3Texture;

#[cfg(feature = "serde-support")]
use serde::{Deserialize, Serialize};

/// Mapping from mesh name prefixes to textures
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
pub struct Skin {
    /// In file order, keys unique
    entries: Vec<(String, Md3Texture)>,
}

impl Skin {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parse<R: Read>(reader: &mut R) -> Result<Self> {
        let mut text = String::new();
        reader.read_to_string(&mut text)?;
        text.parse()
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        fs::read_to_string(path)?.parse()
    }

    /// Set the texture for meshes whose name starts with `prefix`,
    /// replacing an earlier entry with the same prefix
    pub fn insert(&mut self, prefix: &str, texture: Md3Texture) {
        match self.entries.iter_mut().find(|(k, _)| k == prefix) {
            Some(entry) => entry.1 = texture,
            None => self.entries.push((prefix.to_string(), texture)),
        }
    }

    /// Texture for a mesh; the longest stored prefix of `mesh_name` wins
    pub fn texture(&self, mesh_name: &str) -> Option<&Md3Texture> {
        self.entries
            .iter()
            .filter(|(prefix, _)| mesh_name.starts_with(prefix.as_str()))
            .max_by_key(|(prefix, _)| prefix.len())
            .map(|(_, texture)| texture)
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &Md3Texture)> {
        self.entries.iter().map(|(k, t)| (k.as_str(), t))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromStr for Skin {
    type Err = Md3Error;

    /// Lines without exactly two comma separated names are ignored
    fn from_str(text: &str) -> Result<Self> {
        let mut skin = Self::new();
        for line in text.lines() {
            let tokens: Vec<&str> = line
                .trim()
                .split(',')
                .filter(|t| !t.is_empty())
                .collect();
            if let &[mesh, texture] = tokens.as_slice() {
                let (mesh, texture) = (mesh.trim(), texture.trim());
                trace!("skin: {} -> {}", mesh, texture);
                skin.insert(mesh, Md3Texture::named(texture));
            }
        }
        Ok(skin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    const SARGE: &str = "tag_head,\r\nu_torso,models/players/sarge/default.tga\r\n\
                         l_legs,models/players/sarge/default_l.tga\r\n";

    #[test]
    fn test_parse_crlf() {
        let skin: Skin = SARGE.parse().unwrap();
        assert_eq!(skin.len(), 2);
        assert_eq!(
            skin.texture("u_torso").unwrap().source,
            "models/players/sarge/default.tga"
        );
    }

    #[test]
    fn test_prefix_match() {
        let skin: Skin = "l_legs,l_legs_red".parse().unwrap();
        assert_eq!(skin.texture("l_legs_2").unwrap().name, "l_legs_red");
        assert!(skin.texture("l_leg").is_none());
    }

    #[test]
    fn test_longest_prefix_wins() {
        let skin: Skin = "l_,short.tga\nl_legs_2,exact.tga\nl_legs,middle.tga"
            .parse()
            .unwrap();
        assert_eq!(skin.texture("l_legs_2").unwrap().name, "exact.tga");
        assert_eq!(skin.texture("l_legs_3").unwrap().name, "middle.tga");
        assert_eq!(skin.texture("l_foot").unwrap().name, "short.tga");
    }

    #[test]
    fn test_later_line_replaces_key() {
        let skin: Skin = "h_head,a.tga\nh_head,b.tga".parse().unwrap();
        assert_eq!(skin.len(), 1);
        assert_eq!(skin.texture("h_head").unwrap().name, "b.tga");
    }

    #[test_case("" ; "empty line")]
    #[test_case("just_one" ; "one token")]
    #[test_case("a,b,c" ; "three tokens")]
    #[test_case(",,," ; "only commas")]
    fn test_ignored_lines(line: &str) {
        let skin: Skin = line.parse().unwrap();
        assert!(skin.is_empty());
    }

    #[test]
    fn test_empty_fields_collapse() {
        let skin: Skin = "h_head,,head.tga".parse().unwrap();
        assert_eq!(skin.texture("h_head").unwrap().name, "head.tga");
    }
}
