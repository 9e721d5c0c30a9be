//! Mailbox 5: analog baseband register access
//!
//! The ABB sits behind an I2C bus owned by the PRCMU; the firmware proxies
//! register transfers of up to four bytes.

use super::regs::mb5;
use super::{Prcmu, PrcmuError};
use crate::drivers::bus::Bus;
use crate::drivers::mailbox::Expect;
use crate::platform::Platform;

fn check_size(len: usize) -> Result<u8, PrcmuError> {
    if (1..=mb5::MAX_TRANSFER).contains(&len) {
        Ok(len as u8)
    } else {
        Err(PrcmuError::InvalidArgument("ABB transfer size"))
    }
}

impl<B: Bus, P: Platform> Prcmu<B, P> {
    /// Read `value.len()` consecutive ABB registers starting at `reg`.
    pub fn abb_read(&self, slave: u8, reg: u8, value: &mut [u8]) -> Result<(), PrcmuError> {
        let size = check_size(value.len())?;

        let mut tx = self.abb.begin();
        let ack = tx.send(
            &self.link(),
            mb5::header::I2C_READ,
            Expect::success(mb5::header::I2C_READ),
            self.config.abb_timeout_us,
            |req, _| {
                req.write8(mb5::req::I2C_SLAVE, slave);
                req.write8(mb5::req::I2C_REG, reg);
                req.write8(mb5::req::I2C_SIZE, size);
            },
        )?;

        value.copy_from_slice(&ack.value[..value.len()]);
        Ok(())
    }

    /// Write `value` to consecutive ABB registers starting at `reg`.
    pub fn abb_write(&self, slave: u8, reg: u8, value: &[u8]) -> Result<(), PrcmuError> {
        let size = check_size(value.len())?;

        let mut tx = self.abb.begin();
        tx.send(
            &self.link(),
            mb5::header::I2C_WRITE,
            Expect::success(mb5::header::I2C_WRITE),
            self.config.abb_timeout_us,
            |req, _| {
                req.write8(mb5::req::I2C_SLAVE, slave);
                req.write8(mb5::req::I2C_REG, reg);
                req.write8(mb5::req::I2C_SIZE, size);
                req.write_bytes(mb5::req::I2C_DATA, value);
            },
        )?;
        Ok(())
    }
}
