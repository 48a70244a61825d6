use anyhow::{Context, Result};
use std::ffi::OsString;
use std::io::Write;
use std::path::Path;
use std::process::{Child, Command, Stdio};

#[derive(Debug, Clone)]
pub struct EncoderSettings {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub codec: String,
    pub pix_fmt: String,
    pub crf: u32,
    pub bitrate: Option<String>,
}

impl EncoderSettings {
    /// Bytes in one RGBA frame.
    pub fn frame_len(&self) -> usize {
        self.width as usize * self.height as usize * 4
    }

    fn args(&self, output_path: &Path, input_audio: Option<&Path>) -> Vec<OsString> {
        let video_size = format!("{}x{}", self.width, self.height);
        let framerate = self.fps.to_string();
        let mut args: Vec<OsString> = [
            "-y",
            "-f", "rawvideo",
            "-pixel_format", "rgba",
            "-video_size", video_size.as_str(),
            "-framerate", framerate.as_str(),
            "-i", "pipe:0",
        ]
        .map(OsString::from)
        .to_vec();

        if let Some(audio) = input_audio {
            args.push("-i".into());
            args.push(audio.as_os_str().to_owned());
        }

        args.extend(["-c:v", self.codec.as_str(), "-pix_fmt", self.pix_fmt.as_str()].map(OsString::from));

        if let Some(br) = &self.bitrate {
            args.extend(["-b:v", br.as_str()].map(OsString::from));
        } else {
            let crf = self.crf.to_string();
            args.extend(["-crf", crf.as_str(), "-preset", "medium"].map(OsString::from));
        }

        if input_audio.is_some() {
            args.extend(["-c:a", "aac", "-b:a", "192k", "-shortest"].map(OsString::from));
        }

        args.push(output_path.as_os_str().to_owned());
        args
    }
}

pub struct FfmpegEncoder {
    child: Child,
    frame_len: usize,
}

impl FfmpegEncoder {
    pub fn new(
        output_path: &Path,
        input_audio: Option<&Path>,
        settings: &EncoderSettings,
    ) -> Result<Self> {
        let child = Command::new("ffmpeg")
            .args(settings.args(output_path, input_audio))
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .context("Failed to spawn ffmpeg. Is ffmpeg installed?")?;

        log::info!(
            "FFmpeg encoder started: {}x{} @ {}fps, codec={}",
            settings.width,
            settings.height,
            settings.fps,
            settings.codec
        );

        Ok(Self {
            child,
            frame_len: settings.frame_len(),
        })
    }

    pub fn write_frame(&mut self, rgba_pixels: &[u8]) -> Result<()> {
        if rgba_pixels.len() != self.frame_len {
            anyhow::bail!(
                "Frame is {} bytes, encoder expects {}",
                rgba_pixels.len(),
                self.frame_len
            );
        }
        let stdin = self.child.stdin.as_mut().context("FFmpeg stdin not available")?;
        stdin.write_all(rgba_pixels).context("Failed to write frame to ffmpeg")?;
        Ok(())
    }

    pub fn finish(mut self) -> Result<()> {
        // Close stdin to signal EOF
        drop(self.child.stdin.take());

        let output = self.child.wait_with_output().context("Failed to wait for ffmpeg")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("FFmpeg exited with error:\n{}", stderr);
        }

        log::info!("FFmpeg encoding complete");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(bitrate: Option<&str>) -> EncoderSettings {
        EncoderSettings {
            width: 640,
            height: 180,
            fps: 30,
            codec: "libx264".into(),
            pix_fmt: "yuv420p".into(),
            crf: 18,
            bitrate: bitrate.map(String::from),
        }
    }

    fn joined(args: &[OsString]) -> String {
        args.iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[test]
    fn video_only_has_no_audio_flags() {
        let args = joined(&settings(None).args(Path::new("out.mp4"), None));
        assert!(args.contains("-video_size 640x180"));
        assert!(args.contains("-crf 18"));
        assert!(!args.contains("-c:a"));
        assert!(!args.contains("-shortest"));
        assert!(args.ends_with("out.mp4"));
    }

    #[test]
    fn audio_track_is_muxed() {
        let args = joined(&settings(Some("5M")).args(Path::new("out.mp4"), Some(Path::new("song.mp3"))));
        assert!(args.contains("-i pipe:0 -i song.mp3"));
        assert!(args.contains("-b:v 5M"));
        assert!(!args.contains("-crf"));
        assert!(args.contains("-c:a aac"));
        assert!(args.contains("-shortest"));
    }

    #[test]
    fn frame_len_is_rgba() {
        assert_eq!(settings(None).frame_len(), 640 * 180 * 4);
    }
}
