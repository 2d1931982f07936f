//! Texture references and the renderer-side texture resource table.
//!
//! Decoding image files is left to the caller: a [`TextureLoader`] turns a
//! source path into a [`DecodedImage`]. The [`TextureCache`] hands out
//! [`TextureHandle`]s keyed by source path, so several meshes naming the same
//! file share one handle.

use std::collections::HashMap;

use log::{debug, warn};

use crate::error::{Md3Error, Result};
use crate::scene::{NodeId, SceneGraph};

#[cfg(feature = "serde-support")]
use serde::{Deserialize, Serialize};

/// Texture slot of a mesh
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
pub struct Md3Texture {
    /// Name as written in the .md3 or .skin file
    pub name: String,
    /// Path the pixel data is loaded from; the cache key
    pub source: String,
    /// Pixel data supplied directly instead of through a loader
    #[cfg_attr(feature = "serde-support", serde(skip))]
    pub image: Option<DecodedImage>,
}

impl Md3Texture {
    /// Texture whose pixels are loaded from `source`
    pub fn new(name: &str, source: &str) -> Self {
        Self {
            name: name.trim().to_string(),
            source: source.trim().to_string(),
            image: None,
        }
    }

    /// Texture referenced by name only, as stored in an MD3 mesh
    pub fn named(name: &str) -> Self {
        Self::new(name, name)
    }

    pub fn with_image(mut self, image: DecodedImage) -> Self {
        self.image = Some(image);
        self
    }
}

/// Decoded RGBA8 pixel data
#[derive(Clone, PartialEq, Eq, Default)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    /// `width * height * 4` bytes, RGBA order
    pub rgba: Vec<u8>,
}

impl std::fmt::Debug for DecodedImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecodedImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.rgba.len())
            .finish()
    }
}

impl DecodedImage {
    /// Wrap RGBA8 data, checking its length
    pub fn from_rgba(width: u32, height: u32, rgba: Vec<u8>) -> Result<Self> {
        let expected = width as usize * height as usize * 4;
        if rgba.len() != expected {
            return Err(Md3Error::Texture(format!(
                "{width}x{height} image needs {expected} bytes, got {}",
                rgba.len()
            )));
        }
        Ok(Self {
            width,
            height,
            rgba,
        })
    }

    /// Convert packed RGB (24 bit) or RGBA (32 bit) pixels to RGBA8
    pub fn from_pixels(width: u32, height: u32, depth: u8, pixels: &[u8]) -> Result<Self> {
        let rgba = match depth {
            32 => pixels.to_vec(),
            24 => pixels
                .chunks_exact(3)
                .flat_map(|p| [p[0], p[1], p[2], 0xFF])
                .collect(),
            other => return Err(Md3Error::UnsupportedColorMapDepth(other)),
        };
        Self::from_rgba(width, height, rgba)
    }
}

/// Opaque handle of a texture owned by a [`TextureCache`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
pub struct TextureHandle(pub u32);

/// Source of decoded pixel data
pub trait TextureLoader {
    fn load(&mut self, source: &str) -> Result<DecodedImage>;
}

impl<F> TextureLoader for F
where
    F: FnMut(&str) -> Result<DecodedImage>,
{
    fn load(&mut self, source: &str) -> Result<DecodedImage> {
        self(source)
    }
}

/// Texture of one mesh of one scene node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureBinding {
    pub node: NodeId,
    pub mesh: usize,
    pub handle: TextureHandle,
}

#[derive(Debug)]
struct CachedTexture {
    handle: TextureHandle,
    image: DecodedImage,
}

/// Texture resource table keyed by source path
pub struct TextureCache<L> {
    loader: L,
    entries: HashMap<String, CachedTexture>,
    next_handle: u32,
}

impl<L: TextureLoader> TextureCache<L> {
    pub fn new(loader: L) -> Self {
        Self {
            loader,
            entries: HashMap::new(),
            next_handle: 1,
        }
    }

    fn allocate(&mut self) -> TextureHandle {
        let handle = TextureHandle(self.next_handle);
        self.next_handle += 1;
        handle
    }

    /// Register already decoded pixels under `source`
    pub fn insert(&mut self, source: &str, image: DecodedImage) -> TextureHandle {
        if let Some(entry) = self.entries.get_mut(source) {
            entry.image = image;
            return entry.handle;
        }
        let handle = self.allocate();
        self.entries
            .insert(source.to_string(), CachedTexture { handle, image });
        handle
    }

    /// Handle for `source`, loading it on first use
    pub fn get_or_load(&mut self, source: &str) -> Result<TextureHandle> {
        if let Some(entry) = self.entries.get(source) {
            return Ok(entry.handle);
        }
        let image = self.loader.load(source)?;
        debug!(
            "Loaded texture '{}' ({}x{})",
            source, image.width, image.height
        );
        Ok(self.insert(source, image))
    }

    /// Reload the pixels of `source`, keeping its handle
    pub fn refresh(&mut self, source: &str) -> Result<TextureHandle> {
        let image = self.loader.load(source)?;
        debug!("Refreshed texture '{}'", source);
        Ok(self.insert(source, image))
    }

    /// Reload every cached texture
    pub fn refresh_all(&mut self) -> Result<()> {
        let mut sources: Vec<String> = self.entries.keys().cloned().collect();
        sources.sort();
        for source in sources {
            self.refresh(&source)?;
        }
        Ok(())
    }

    pub fn handle(&self, source: &str) -> Option<TextureHandle> {
        self.entries.get(source).map(|e| e.handle)
    }

    pub fn image(&self, handle: TextureHandle) -> Option<&DecodedImage> {
        self.entries
            .values()
            .find(|e| e.handle == handle)
            .map(|e| &e.image)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolve the first texture slot of every mesh below `root`.
    ///
    /// Meshes without textures are skipped. Textures that fail to load are
    /// logged and skipped so one missing image does not blank the model.
    pub fn bind_scene(&mut self, graph: &SceneGraph, root: NodeId) -> Result<Vec<TextureBinding>> {
        let mut wanted = Vec::new();
        graph.visit(root, |id, node| {
            for (mesh, m) in node.model.meshes.iter().enumerate() {
                if let Some(texture) = m.textures.first() {
                    wanted.push((id, mesh, texture.clone()));
                }
            }
        })?;

        let mut bindings = Vec::with_capacity(wanted.len());
        for (node, mesh, texture) in wanted {
            let handle = match (&texture.image, self.handle(&texture.source)) {
                (_, Some(handle)) => handle,
                (Some(image), None) => self.insert(&texture.source, image.clone()),
                (None, None) => match self.get_or_load(&texture.source) {
                    Ok(handle) => handle,
                    Err(e) => {
                        warn!("Texture '{}' unavailable: {}", texture.source, e);
                        continue;
                    }
                },
            };
            bindings.push(TextureBinding { node, mesh, handle });
        }
        Ok(bindings)
    }
}
