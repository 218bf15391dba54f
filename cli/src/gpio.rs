//! Sysfs GPIO lines: export the pin, set its direction, and hold the
//! value file open for the lifetime of the line. The pin is driven low
//! (outputs) and unexported again on drop.

use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use morselink_core::LineProbe;

const GPIO_ROOT: &str = "/sys/class/gpio";
// The kernel takes a moment to create the pin directory after export.
const EXPORT_SETTLE: Duration = Duration::from_millis(100);

fn export(pin: u32) -> Result<PathBuf> {
    let dir = PathBuf::from(format!("{GPIO_ROOT}/gpio{pin}"));
    if !dir.exists() {
        fs::write(format!("{GPIO_ROOT}/export"), pin.to_string())
            .with_context(|| format!("exporting GPIO {pin}"))?;
        thread::sleep(EXPORT_SETTLE);
    }
    Ok(dir)
}

fn set_direction(dir: &Path, pin: u32, direction: &str) -> Result<()> {
    fs::write(dir.join("direction"), direction)
        .with_context(|| format!("setting GPIO {pin} direction to {direction}"))
}

fn unexport(pin: u32) {
    let _ = fs::write(format!("{GPIO_ROOT}/unexport"), pin.to_string());
}

/// Output line driving the transmitter LED.
pub struct SysfsOutput {
    pin: u32,
    value: File,
}

impl SysfsOutput {
    pub fn open(pin: u32) -> Result<Self> {
        let dir = export(pin)?;
        set_direction(&dir, pin, "out")?;
        let value = OpenOptions::new()
            .write(true)
            .open(dir.join("value"))
            .with_context(|| format!("opening GPIO {pin} value"))?;
        Ok(Self { pin, value })
    }

    pub fn set(&mut self, on: bool) -> Result<()> {
        self.value.write_all(if on { b"1" } else { b"0" })?;
        self.value.seek(SeekFrom::Start(0))?;
        Ok(())
    }
}

impl Drop for SysfsOutput {
    fn drop(&mut self) {
        let _ = self.set(false);
        unexport(self.pin);
    }
}

/// Input line sampling the receiver photodiode/comparator.
pub struct SysfsInput {
    pin: u32,
    value: File,
}

impl SysfsInput {
    pub fn open(pin: u32) -> Result<Self> {
        let dir = export(pin)?;
        set_direction(&dir, pin, "in")?;
        let value = OpenOptions::new()
            .read(true)
            .open(dir.join("value"))
            .with_context(|| format!("opening GPIO {pin} value"))?;
        Ok(Self { pin, value })
    }

    pub fn read_level(&mut self) -> Result<bool> {
        self.value.seek(SeekFrom::Start(0))?;
        let mut buf = [0u8; 1];
        self.value.read_exact(&mut buf)?;
        Ok(buf[0] == b'1')
    }
}

impl Drop for SysfsInput {
    fn drop(&mut self) {
        unexport(self.pin);
    }
}

impl LineProbe for SysfsInput {
    fn is_high(&mut self) -> Result<bool, String> {
        self.read_level().map_err(|e| e.to_string())
    }
}
