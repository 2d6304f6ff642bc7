use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use image::codecs::gif::{GifEncoder, Repeat};
use image::{Delay, RgbaImage};
use tempfile::NamedTempFile;

use crate::colors::Palette;
use crate::config::SimConfig;
use crate::error::{Result, SimError};
use crate::frame::Frame;

/// Encodes frames as an animated GIF. `loop_count` 0 loops forever.
pub fn encode_gif<W: Write>(
    writer: W,
    frames: &[Frame],
    loop_count: u16,
    palette: &Palette,
) -> Result<()> {
    let mut encoder = GifEncoder::new(writer);
    let repeat = if loop_count == 0 {
        Repeat::Infinite
    } else {
        Repeat::Finite(loop_count)
    };
    encoder.set_repeat(repeat)?;

    for (index, frame) in frames.iter().enumerate() {
        let rgba = palette.to_rgba(frame);
        let expected = frame.width() * frame.height() * 4;
        let actual = rgba.len();
        let buffer = RgbaImage::from_raw(frame.width() as u32, frame.height() as u32, rgba)
            .ok_or(SimError::FrameSize {
                index,
                expected,
                actual,
            })?;
        // GIF delays are in hundredths of a second
        let delay = Delay::from_numer_denom_ms(u32::from(frame.delay()) * 10, 1);
        encoder.encode_frame(image::Frame::from_parts(buffer, 0, 0, delay))?;
    }

    Ok(())
}

/// Writes the animation to `path`, creating parent directories.
pub fn write_gif(path: &Path, frames: &[Frame], loop_count: u16, palette: &Palette) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut writer = BufWriter::new(File::create(path)?);
    encode_gif(&mut writer, frames, loop_count, palette)?;
    writer.flush()?;
    log::info!("wrote {} frames to {}", frames.len(), path.display());
    Ok(())
}

/// Writes finished GIF bytes to `path` through a temporary file in the same
/// directory, so readers never see a partial artifact.
pub fn save_artifact(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let mut file = NamedTempFile::new_in(dir)?;
    file.write_all(bytes)?;
    file.persist(path).map_err(|err| err.error)?;
    log::info!("wrote {} bytes to {}", bytes.len(), path.display());
    Ok(())
}

/// Saves every frame as `frame_NNNN.png` under `dir`, plus a metadata file
/// describing the run.
pub fn write_png_frames(
    dir: &Path,
    frames: &[Frame],
    config: &SimConfig,
    palette: &Palette,
) -> Result<()> {
    fs::create_dir_all(dir)?;

    for (index, frame) in frames.iter().enumerate() {
        let path = dir.join(format!("frame_{index:04}.png"));
        let rgba = palette.to_rgba(frame);
        let expected = frame.width() * frame.height() * 4;
        if rgba.len() != expected {
            return Err(SimError::FrameSize {
                index,
                expected,
                actual: rgba.len(),
            });
        }
        // Grids are capped well below u32::MAX cells
        save_frame_as_png(&path, &rgba, frame.width() as u32, frame.height() as u32)?;
    }

    let metadata = format!(
        "Generated: {}\nFrames: {}\nSize: {}x{}\nDelay: {}/100 s\nSensor: {} deg at {} cells\nScent decay: {}\nSeed: {}\n",
        chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ"),
        frames.len(),
        config.width,
        config.height,
        config.delay,
        config.sensor_degree,
        config.sensor_distance,
        config.scent_decay,
        config
            .seed
            .map_or_else(|| "random".to_string(), |seed| seed.to_string()),
    );
    fs::write(dir.join("metadata.txt"), metadata)?;

    log::info!("saved {} PNG frames to {}", frames.len(), dir.display());
    Ok(())
}

fn save_frame_as_png(path: &Path, frame_data: &[u8], width: u32, height: u32) -> Result<()> {
    let file = File::create(path)?;
    let w = BufWriter::new(file);

    let mut encoder = png::Encoder::new(w, width, height);
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);

    let mut writer = encoder.write_header()?;
    writer.write_image_data(frame_data)?;
    writer.finish()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::run;

    fn config() -> SimConfig {
        SimConfig {
            width: 24,
            height: 16,
            n_frames: 4,
            seed: Some(11),
            ..SimConfig::default()
        }
    }

    #[test]
    fn test_gif_header_and_trailer() {
        let frames = run(config()).unwrap();
        let mut bytes = Vec::new();
        encode_gif(&mut bytes, &frames, 1000, &Palette::default()).unwrap();

        assert!(bytes.starts_with(b"GIF89a"));
        assert_eq!(bytes.last(), Some(&0x3B));
    }

    #[test]
    fn test_write_gif_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tmp").join("out.gif");
        let frames = run(config()).unwrap();

        write_gif(&path, &frames, 0, &Palette::default()).unwrap();

        assert!(fs::metadata(&path).unwrap().len() > 0);
    }

    #[test]
    fn test_save_artifact_replaces_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("out.gif");

        save_artifact(&path, b"first").unwrap();
        save_artifact(&path, b"second").unwrap();

        assert_eq!(fs::read(&path).unwrap(), b"second");
        assert_eq!(fs::read_dir(path.parent().unwrap()).unwrap().count(), 1);
    }

    #[test]
    fn test_write_png_frames() {
        let dir = tempfile::tempdir().unwrap();
        let frames = run(config()).unwrap();

        write_png_frames(dir.path(), &frames, &config(), &Palette::default()).unwrap();

        for index in 0..4 {
            assert!(dir.path().join(format!("frame_{index:04}.png")).exists());
        }
        let metadata = fs::read_to_string(dir.path().join("metadata.txt")).unwrap();
        assert!(metadata.contains("Frames: 4"));
        assert!(metadata.contains("Seed: 11"));
    }

    #[test]
    fn test_write_png_frames_wide_strip() {
        let dir = tempfile::tempdir().unwrap();
        let config = SimConfig {
            width: 70_000,
            height: 2,
            n_frames: 1,
            ..config()
        };
        let frames = run(config.clone()).unwrap();

        write_png_frames(dir.path(), &frames, &config, &Palette::default()).unwrap();

        let decoder = png::Decoder::new(File::open(dir.path().join("frame_0000.png")).unwrap());
        let reader = decoder.read_info().unwrap();
        assert_eq!((reader.info().width, reader.info().height), (70_000, 2));
    }
}
