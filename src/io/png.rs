use std::path::Path;

use image::ImageError;

use crate::render::Framebuffer;

/// Enregistre l'image au format PNG.
pub fn save_png(frame: &Framebuffer, output: &Path) -> Result<(), ImageError> {
    let img = frame.to_rgb_image().ok_or_else(|| {
        ImageError::from(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            "Impossible de créer l'image depuis le buffer",
        ))
    })?;
    // Avec image 0.25, save() détecte automatiquement le format depuis l'extension
    img.save(output)
}
