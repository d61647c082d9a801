use embedded_hal::i2c::{I2c, Operation};
use embedded_hal_async::i2c::I2c as AsyncI2c;
use register_access::{AsyncBusAccess, BusAccess};

pub struct Ltc2946I2cInterface<I> {
    pub i2c: I,
}

impl<I> Ltc2946I2cInterface<I> {
    const DEVICE_ADDR: u8 = 0x67;
}

impl<I> BusAccess for Ltc2946I2cInterface<I>
where
    I: I2c,
{
    type Error = I::Error;

    fn read_block(&mut self, address: u8, buffer: &mut [u8]) -> Result<(), Self::Error> {
        self.i2c.transaction(
            Self::DEVICE_ADDR,
            &mut [Operation::Write(&[address]), Operation::Read(buffer)],
        )
    }

    fn write_block(&mut self, address: u8, bytes: &[u8]) -> Result<(), Self::Error> {
        self.i2c.transaction(
            Self::DEVICE_ADDR,
            &mut [Operation::Write(&[address]), Operation::Write(bytes)],
        )
    }
}

impl<I> AsyncBusAccess for Ltc2946I2cInterface<I>
where
    I: AsyncI2c,
{
    type Error = I::Error;

    async fn read_block_async(&mut self, address: u8, buffer: &mut [u8]) -> Result<(), Self::Error> {
        self.i2c
            .transaction(
                Self::DEVICE_ADDR,
                &mut [Operation::Write(&[address]), Operation::Read(buffer)],
            )
            .await
    }

    async fn write_block_async(&mut self, address: u8, bytes: &[u8]) -> Result<(), Self::Error> {
        self.i2c
            .transaction(
                Self::DEVICE_ADDR,
                &mut [Operation::Write(&[address]), Operation::Write(bytes)],
            )
            .await
    }
}
