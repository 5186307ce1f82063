use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::time::Instant;

/// Drop-timer for coarse per-stage performance measurement.
///
/// Every scope logs its wall time at `info` level; the on-disk profile log is
/// opt-in via the `FLUOLAB_PROFILE` environment variable so normal runs never
/// touch the data directory.
pub struct ProfileScope {
    label: String,
    start: Instant,
}

impl ProfileScope {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            start: Instant::now(),
        }
    }
}

impl Drop for ProfileScope {
    fn drop(&mut self) {
        let elapsed_ms = self.start.elapsed().as_secs_f64() * 1000.0;

        log::info!("[PROFILE] {} - {:.3}ms", self.label, elapsed_ms);

        if std::env::var_os("FLUOLAB_PROFILE").is_some() {
            if let Err(e) = write_profile_log(&self.label, elapsed_ms) {
                log::warn!("Failed to write profile log: {}", e);
            }
        }
    }
}

fn get_profile_log_path() -> PathBuf {
    let app_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("FLUOLAB");

    std::fs::create_dir_all(&app_dir).ok();
    app_dir.join("performance_profile.log")
}

fn write_profile_log(label: &str, duration_ms: f64) -> std::io::Result<()> {
    let log_path = get_profile_log_path();
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)?;

    let timestamp = chrono::Utc::now().to_rfc3339();
    writeln!(file, "{} | {} | {:.3}ms", timestamp, label, duration_ms)?;

    Ok(())
}

/// Measure the enclosing scope under the given label.
#[macro_export]
macro_rules! profile_scope {
    ($label:expr) => {
        let _profile_scope = $crate::profiling::ProfileScope::new($label);
    };
}

/// Where the opt-in profile log ends up, for display to the user.
pub fn get_profile_log_location() -> String {
    get_profile_log_path()
        .to_str()
        .unwrap_or("Unknown")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_drop_does_not_panic() {
        {
            profile_scope!("test-stage");
        }
    }

    #[test]
    fn test_log_location_is_reported() {
        assert!(get_profile_log_location().contains("performance_profile.log"));
    }
}
