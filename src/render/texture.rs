use crate::foundation::cache::BoundedCache;
use crate::foundation::error::SsbResult;
use crate::foundation::math::mul_div255_round;
use crate::script::tags::TextureWrap;
use anyhow::Context;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

/// Default number of decoded textures kept in memory.
pub const DEFAULT_TEXTURE_CACHE_CAPACITY: usize = 16;

/// A decoded image in premultiplied RGBA8.
#[derive(Debug, Clone, PartialEq)]
pub struct Texture {
    pub width: u32,
    pub height: u32,
    pub rgba8_premul: Vec<u8>,
}

impl Texture {
    /// Decode an encoded image (any format the `image` crate reads).
    pub fn decode(bytes: &[u8]) -> SsbResult<Self> {
        let rgba = image::load_from_memory(bytes)
            .context("decode texture")?
            .to_rgba8();
        let (width, height) = rgba.dimensions();
        let mut rgba8_premul = rgba.into_raw();
        for px in rgba8_premul.chunks_exact_mut(4) {
            let a = px[3];
            for c in &mut px[..3] {
                *c = mul_div255_round(*c, a);
            }
        }
        Ok(Self {
            width,
            height,
            rgba8_premul,
        })
    }

    /// Premultiplied pixel at integer texel coordinates, wrapped by `wrap`.
    pub fn sample(&self, x: i64, y: i64, wrap: TextureWrap) -> [u8; 4] {
        if self.width == 0 || self.height == 0 {
            return [0; 4];
        }
        let tx = wrap_coord(x, i64::from(self.width), wrap);
        let ty = wrap_coord(y, i64::from(self.height), wrap);
        let i = (ty * self.width as usize + tx) * 4;
        [
            self.rgba8_premul[i],
            self.rgba8_premul[i + 1],
            self.rgba8_premul[i + 2],
            self.rgba8_premul[i + 3],
        ]
    }
}

fn wrap_coord(v: i64, len: i64, wrap: TextureWrap) -> usize {
    let r = match wrap {
        TextureWrap::Clamp => v.clamp(0, len - 1),
        TextureWrap::Repeat => v.rem_euclid(len),
        TextureWrap::Mirror => {
            let m = v.rem_euclid(2 * len);
            if m < len { m } else { 2 * len - 1 - m }
        }
    };
    r as usize
}

/// Textures loaded from disk relative to a base directory, shared between renders.
///
/// Load failures are cached too, so a missing file is reported once.
pub struct TextureCache {
    base_dir: Option<PathBuf>,
    inner: Mutex<BoundedCache<String, Option<Arc<Texture>>>>,
}

impl TextureCache {
    pub fn new(base_dir: Option<PathBuf>, capacity: usize) -> Self {
        Self {
            base_dir,
            inner: Mutex::new(BoundedCache::new(capacity)),
        }
    }

    /// Directory texture file names are resolved against.
    pub fn base_dir(&self) -> Option<&Path> {
        self.base_dir.as_deref()
    }

    /// The texture stored in `file`, loading it on first use.
    pub fn get(&self, file: &str) -> Option<Arc<Texture>> {
        let key = file.to_owned();
        let mut cache = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        if cache.contains(&key) {
            return cache.get(&key);
        }
        let loaded = self.load(file);
        cache.add(key, loaded.clone());
        loaded
    }

    /// Insert an already decoded texture under `file`.
    pub fn insert(&self, file: impl Into<String>, texture: Texture) {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .add(file.into(), Some(Arc::new(texture)));
    }

    fn load(&self, file: &str) -> Option<Arc<Texture>> {
        let path = match &self.base_dir {
            Some(dir) => dir.join(file),
            None => PathBuf::from(file),
        };
        match std::fs::read(&path)
            .map_err(Into::into)
            .and_then(|bytes| Texture::decode(&bytes))
        {
            Ok(tex) => Some(Arc::new(tex)),
            Err(err) => {
                tracing::warn!(path = %path.display(), %err, "texture unavailable");
                None
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/texture.rs"]
mod tests;
