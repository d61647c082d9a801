#![no_std]
#![allow(async_fn_in_trait)]

use device_descriptor::{Proxy, ReadOnlyRegister, Register};

/// Byte-oriented access to a device's register file.
///
/// One `read_block`/`write_block` call maps to exactly one bus transaction.
/// Implementations must not retry, split or reorder transactions; errors
/// propagate to the caller unchanged.
pub trait BusAccess {
    type Error;

    fn read_block(&mut self, address: u8, buffer: &mut [u8]) -> Result<(), Self::Error>;
    fn write_block(&mut self, address: u8, bytes: &[u8]) -> Result<(), Self::Error>;

    fn read_register<R>(&mut self) -> Result<R, Self::Error>
    where
        R: ReadOnlyRegister,
    {
        let mut buffer = [0];
        self.read_block(R::ADDRESS, &mut buffer)?;
        Ok(R::from_bits(buffer[0]))
    }

    fn write_register<R>(&mut self, reg: R) -> Result<(), Self::Error>
    where
        R: Register,
    {
        self.write_block(R::ADDRESS, &[reg.bits()])
    }
}

pub trait AsyncBusAccess {
    type Error;

    async fn read_block_async(&mut self, address: u8, buffer: &mut [u8])
        -> Result<(), Self::Error>;
    async fn write_block_async(&mut self, address: u8, bytes: &[u8]) -> Result<(), Self::Error>;

    async fn read_register_async<R>(&mut self) -> Result<R, Self::Error>
    where
        R: ReadOnlyRegister,
    {
        let mut buffer = [0];
        self.read_block_async(R::ADDRESS, &mut buffer).await?;
        Ok(R::from_bits(buffer[0]))
    }

    async fn write_register_async<R>(&mut self, reg: R) -> Result<(), Self::Error>
    where
        R: Register,
    {
        self.write_block_async(R::ADDRESS, &[reg.bits()]).await
    }
}
