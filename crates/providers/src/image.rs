use crate::{ImageInput, ProviderError};
use bytes::Bytes;
use reqwest::multipart::Part;
use std::path::Path;

/// MIME type inferred from the file extension; unknown extensions are sent as JPEG.
pub fn mime_for_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();
    match ext.as_str() {
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "heic" => "image/heic",
        "heif" => "image/heif",
        _ => "image/jpeg",
    }
}

/// Reads a local image file into memory.
pub async fn read_image(path: &Path) -> Result<ImageInput, ProviderError> {
    let data = tokio::fs::read(path).await?;
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image.jpg".to_string());
    Ok(ImageInput {
        filename,
        mime_type: mime_for_path(path).to_string(),
        data: Bytes::from(data),
    })
}

pub(crate) fn to_part(image: &ImageInput) -> Result<Part, ProviderError> {
    Part::bytes(image.data.to_vec())
        .file_name(image.filename.clone())
        .mime_str(&image.mime_type)
        .map_err(|e| ProviderError::RequestFailed(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mime_follows_extension() {
        assert_eq!(mime_for_path(Path::new("a/receipt.PNG")), "image/png");
        assert_eq!(mime_for_path(Path::new("photo.jpeg")), "image/jpeg");
        assert_eq!(mime_for_path(Path::new("noext")), "image/jpeg");
    }

    #[tokio::test]
    async fn read_image_keeps_file_name_and_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("apple.webp");
        std::fs::write(&path, b"RIFFxxxxWEBP").unwrap();
        let image = read_image(&path).await.unwrap();
        assert_eq!(image.filename, "apple.webp");
        assert_eq!(image.mime_type, "image/webp");
        assert_eq!(image.size(), 12);
    }
}
