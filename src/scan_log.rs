// Daily scan log: one append-only text file per day in the log directory

use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate};
use parking_lot::Mutex;
use tracing::info;

pub struct ScanLog {
    path: PathBuf,
    writer: Mutex<BufWriter<File>>,
}

pub fn log_file_name(date: NaiveDate) -> String {
    date.format("%Y.%m.%d.txt").to_string()
}

impl ScanLog {
    // Open today's log file, creating the directory and file as needed
    pub fn open_today(log_dir: &Path) -> io::Result<Self> {
        Self::open_for(log_dir, Local::now().date_naive())
    }

    pub fn open_for(log_dir: &Path, date: NaiveDate) -> io::Result<Self> {
        std::fs::create_dir_all(log_dir)?;
        let path = log_dir.join(log_file_name(date));
        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        Ok(Self {
            path,
            writer: Mutex::new(BufWriter::new(file)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    // File and console
    pub fn log(&self, message: &str) -> io::Result<()> {
        self.file_log(message)?;
        info!("{}", message);
        Ok(())
    }

    // File only, for output too long for the console
    pub fn file_log(&self, message: &str) -> io::Result<()> {
        let mut writer = self.writer.lock();
        writeln!(writer, "{}", message)
    }

    pub fn flush(&self) -> io::Result<()> {
        self.writer.lock().flush()
    }
}

impl Drop for ScanLog {
    fn drop(&mut self) {
        let _ = self.writer.get_mut().flush();
    }
}
