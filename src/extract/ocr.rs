use crate::error::OcrError;
use image::{DynamicImage, ImageFormat};
use regex::Regex;
use std::io::{Cursor, ErrorKind, Read, Write};
use std::path::PathBuf;
use std::process::{Child, Command, Output, Stdio};
use std::sync::OnceLock;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

pub trait OcrBackend: Send + Sync {
    /// Recognizes text in `image` using a `+`-joined language profile such as `eng+hin`.
    fn recognize(&self, image: &DynamicImage, languages: &str) -> Result<String, OcrError>;
}

/// Shells out to the `tesseract` executable, streaming a PNG over stdin.
pub struct TesseractCli {
    exe: PathBuf,
    dpi: u32,
    timeout: Option<Duration>,
}

impl TesseractCli {
    pub fn new(exe: &str, dpi: u32, timeout_seconds: u64) -> Self {
        Self {
            exe: PathBuf::from(exe),
            dpi,
            timeout: (timeout_seconds > 0).then(|| Duration::from_secs(timeout_seconds)),
        }
    }

    pub fn version(&self) -> Result<String, OcrError> {
        let out = Command::new(&self.exe).arg("--version").output()?;
        // Older releases print the banner on stderr.
        let banner = if out.stdout.is_empty() {
            out.stderr
        } else {
            out.stdout
        };
        Ok(String::from_utf8_lossy(&banner)
            .lines()
            .next()
            .unwrap_or_default()
            .trim()
            .to_string())
    }

    pub fn list_languages(&self) -> Result<Vec<String>, OcrError> {
        let out = Command::new(&self.exe).arg("--list-langs").output()?;
        if !out.status.success() {
            return Err(OcrError::Failed(
                String::from_utf8_lossy(&out.stderr).trim().to_string(),
            ));
        }
        Ok(String::from_utf8_lossy(&out.stdout)
            .lines()
            .skip(1)
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty())
            .collect())
    }
}

impl OcrBackend for TesseractCli {
    fn recognize(&self, image: &DynamicImage, languages: &str) -> Result<String, OcrError> {
        let mut png = Vec::new();
        image.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;

        debug!("tesseract -l {languages} ({} bytes)", png.len());
        let mut child = Command::new(&self.exe)
            .args(["stdin", "stdout", "-l", languages, "--dpi"])
            .arg(self.dpi.to_string())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        // Readers start before the write so a chatty child cannot block on a full pipe.
        let stdout_thread = drain(child.stdout.take());
        let stderr_thread = drain(child.stderr.take());

        if let Some(mut stdin) = child.stdin.take() {
            match stdin.write_all(&png) {
                Ok(()) => {}
                // Tesseract exits before reading stdin when the first language fails to load.
                Err(e) if e.kind() == ErrorKind::BrokenPipe => {
                    debug!("tesseract closed stdin early");
                }
                Err(e) => {
                    reap(&mut child, stdout_thread, stderr_thread);
                    return Err(e.into());
                }
            }
        }

        let output = wait_with_timeout(&mut child, self.timeout, stdout_thread, stderr_thread)?;
        let stderr = String::from_utf8_lossy(&output.stderr);

        if !output.status.success() {
            return Err(classify_failure(&stderr));
        }
        // Tesseract can exit 0 after failing to load one of several languages.
        if let Some(language) = missing_language(&stderr) {
            return Err(OcrError::ScriptPackUnavailable {
                language,
                message: stderr.trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Maps tesseract's stderr to a typed failure.
pub fn classify_failure(stderr: &str) -> OcrError {
    match missing_language(stderr) {
        Some(language) => OcrError::ScriptPackUnavailable {
            language,
            message: stderr.trim().to_string(),
        },
        None => OcrError::Failed(stderr.trim().to_string()),
    }
}

/// Name of the language pack tesseract reported as unloadable, if any.
pub fn missing_language(stderr: &str) -> Option<String> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(r"Failed loading language '([^']+)'").expect("static regex")
    });
    re.captures(stderr).map(|c| c[1].to_string())
}

type Drain = JoinHandle<std::io::Result<Vec<u8>>>;

fn drain<R: Read + Send + 'static>(reader: Option<R>) -> Drain {
    std::thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut r) = reader {
            r.read_to_end(&mut buf)?;
        }
        Ok(buf)
    })
}

fn join(handle: Drain) -> Result<Vec<u8>, OcrError> {
    handle
        .join()
        .map_err(|_| OcrError::Failed("pipe reader thread panicked".into()))?
        .map_err(OcrError::Io)
}

/// Kills the child, waits for it and joins the pipe readers.
fn reap(child: &mut Child, stdout_thread: Drain, stderr_thread: Drain) {
    let _ = child.kill();
    let _ = child.wait();
    let _ = join(stdout_thread);
    let _ = join(stderr_thread);
}

fn wait_with_timeout(
    child: &mut Child,
    timeout: Option<Duration>,
    stdout_thread: Drain,
    stderr_thread: Drain,
) -> Result<Output, OcrError> {
    let start = Instant::now();
    loop {
        let status = match child.try_wait() {
            Ok(status) => status,
            Err(err) => {
                reap(child, stdout_thread, stderr_thread);
                return Err(err.into());
            }
        };
        if let Some(status) = status {
            return Ok(Output {
                status,
                stdout: join(stdout_thread)?,
                stderr: join(stderr_thread)?,
            });
        }

        if let Some(limit) = timeout {
            if start.elapsed() > limit {
                warn!("tesseract timed out after {:?}", limit);
                reap(child, stdout_thread, stderr_thread);
                return Err(OcrError::Timeout(limit));
            }
        }

        std::thread::sleep(Duration::from_millis(20));
    }
}
