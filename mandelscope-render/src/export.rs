//! PNG export with the view embedded as tEXt chunks.

use std::io::BufWriter;
use std::path::Path;

use tracing::debug;

use mandelscope_core::Permalink;

use crate::buffer::RenderBuffer;
use crate::error::RenderError;
use crate::palette::Palette;

/// File name for a poster saved at `epoch_secs`.
pub fn poster_file_name(epoch_secs: u64) -> String {
    format!("mandel-{epoch_secs}.png")
}

/// Write `buffer` as an 8-bit RGBA PNG. When `permalink` is given, the view
/// it describes is embedded so the image can be traced back to a location.
///
/// Uses the `png` crate directly (rather than `image`) to inject custom tEXt
/// chunks readable by exiftool and most image viewers.
pub fn export_png(
    buffer: &RenderBuffer,
    path: &Path,
    permalink: Option<&Permalink>,
) -> crate::Result<()> {
    let file = std::fs::File::create(path)?;
    let writer = BufWriter::new(file);

    let mut encoder = png::Encoder::new(writer, buffer.width, buffer.height);
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    encoder.set_compression(png::Compression::Default);

    let mut chunks = vec![("Software".to_string(), "Mandelscope".to_string())];
    if let Some(link) = permalink {
        chunks.push(("Description".to_string(), build_description(link)));
        chunks.extend(build_metadata_pairs(link));
    }
    for (key, value) in chunks {
        encoder
            .add_text_chunk(key.clone(), value)
            .map_err(|e| RenderError::Export(format!("text chunk '{key}': {e}")))?;
    }

    let mut png_writer = encoder
        .write_header()
        .map_err(|e| RenderError::Export(format!("PNG header: {e}")))?;
    png_writer
        .write_image_data(&buffer.pixels)
        .map_err(|e| RenderError::Export(format!("PNG image data: {e}")))?;

    debug!(
        width = buffer.width,
        height = buffer.height,
        "Exported PNG to {}",
        path.display()
    );
    Ok(())
}

fn build_description(link: &Permalink) -> String {
    format!(
        "Mandelbrot - Center: {} {}i, Zoom: {}, Iterations: {}",
        link.real, link.imag, link.zoom, link.iterations,
    )
}

fn build_metadata_pairs(link: &Permalink) -> Vec<(String, String)> {
    let palette_name = Palette::by_id(link.palette_id)
        .map(|p| p.name())
        .unwrap_or("unknown");
    vec![
        ("Mandelscope.Re".into(), link.real.to_string()),
        ("Mandelscope.Im".into(), link.imag.to_string()),
        ("Mandelscope.Zoom".into(), link.zoom.to_string()),
        ("Mandelscope.Iterations".into(), link.iterations.to_string()),
        ("Mandelscope.Palette".into(), palette_name.to_string()),
        ("Mandelscope.PaletteRotation".into(), link.palette_rotation.to_string()),
        ("Mandelscope.Smooth".into(), link.smooth.to_string()),
        ("Mandelscope.Permalink".into(), link.to_query()),
    ]
}
