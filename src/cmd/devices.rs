// ============================================================================
// src/cmd/devices.rs – `mountforge devices`: print what the wizard would offer
// ============================================================================

use std::io::{self, Write};

use crate::devices::DeviceDescriptor;

pub fn run_devices<W: Write>(out: &mut W, devices: &[DeviceDescriptor]) -> io::Result<()> {
    for device in devices {
        writeln!(out, "{device}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_device_per_line() {
        let devices = vec![
            DeviceDescriptor::new("/dev/sda"),
            DeviceDescriptor::new("/dev/sdb"),
        ];
        let mut buf = Vec::new();
        run_devices(&mut buf, &devices).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "/dev/sda\n/dev/sdb\n");
    }
}
