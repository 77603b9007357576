use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use engine::{
    ActivationContext, AssetStore, TextureError, TextureHandle, TextureInfo, TextureLoader,
};

/// Asset store over the game's shipped `assets/` directory.
pub(crate) fn shipped_assets() -> (AssetStore, PathBuf) {
    let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../assets");
    (AssetStore::new(root.clone()), root)
}

pub(crate) fn activation<'a>(
    assets: &'a mut AssetStore,
    textures: &'a mut FakeTextures,
) -> ActivationContext<'a> {
    ActivationContext {
        assets,
        textures,
    }
}

/// Reads PNG dimensions from the IHDR chunk without decoding pixels.
fn png_size(path: &Path) -> Option<(u32, u32)> {
    let bytes = std::fs::read(path).ok()?;
    let header = bytes.get(16..24)?;
    let width = u32::from_be_bytes(header[0..4].try_into().ok()?);
    let height = u32::from_be_bytes(header[4..8].try_into().ok()?);
    Some((width, height))
}

#[derive(Debug, Default)]
pub(crate) struct FakeTextures {
    next_handle: u32,
    live: BTreeSet<TextureHandle>,
}

impl FakeTextures {
    pub(crate) fn live_count(&self) -> usize {
        self.live.len()
    }
}

impl TextureLoader for FakeTextures {
    fn load_texture(&mut self, path: &Path) -> Result<TextureInfo, TextureError> {
        if !path.is_file() {
            return Err(TextureError::NotFound {
                path: path.to_path_buf(),
            });
        }
        let (width, height) = png_size(path).ok_or_else(|| TextureError::Decode {
            path: path.to_path_buf(),
            reason: "not a png".to_string(),
        })?;
        let handle = TextureHandle(self.next_handle);
        self.next_handle += 1;
        self.live.insert(handle);
        Ok(TextureInfo {
            handle,
            width,
            height,
        })
    }

    fn release_texture(&mut self, handle: TextureHandle) {
        self.live.remove(&handle);
    }
}
