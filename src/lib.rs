#![no_std]

#[macro_use]
extern crate logger;

use device_descriptor::Register;
use embedded_hal::i2c::I2c;
use embedded_hal_async::i2c::I2c as AsyncI2c;
use register_access::{AsyncBusAccess, BusAccess};
use ufmt::uwrite;

use crate::{
    codec::Width,
    descriptors::{CtrlA, VoltageMonitor},
};

pub mod codec;
pub mod descriptors;
pub mod ll;

/// Formatted attribute value. A decimal i64 is at most 20 bytes.
pub type AttributeText = heapless::String<24>;

#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
    /// Propagated verbatim from the bus; the operation is not retried.
    Bus(E),

    /// The name is not in the attribute table.
    UnknownAttribute,

    /// Write attempted on an input (read-only) attribute.
    NotWritable,

    /// The store payload is not a decimal integer.
    InvalidInput,
}

/// Optional board description captured at attach. Keys left `None` fall back
/// to the defaults documented on [`Calibration`].
#[derive(Clone, Copy, Default, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CalibrationConfig {
    pub sense_resistance_microohm: Option<u32>,
    pub divider_r1: Option<u32>,
    pub divider_r2: Option<u32>,
}

/// Board-level calibration of the sense network, resolved once at attach.
///
/// All three values are strictly positive; the conversions divide by them.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Calibration {
    /// Shunt between SENSE+ and SENSE-. The ΔSENSE registers resolve 25μV
    /// across this resistor per LSB.
    pub sense_resistance_microohm: u32,

    /// Upper leg of the ADIN divider.
    pub divider_r1: u32,

    /// Lower leg of the ADIN divider.
    pub divider_r2: u32,
}

impl Default for Calibration {
    fn default() -> Self {
        Self {
            sense_resistance_microohm: 1000,
            divider_r1: 1,
            divider_r2: 1000,
        }
    }
}

impl Calibration {
    /// Resolves the attach-time board description. A missing key falls back
    /// to its default; so does a configured zero, which would otherwise put
    /// a divide-by-zero into the conversions.
    pub fn resolve(config: &CalibrationConfig) -> Self {
        let defaults = Self::default();

        Self {
            sense_resistance_microohm: config
                .sense_resistance_microohm
                .filter(|&value| value > 0)
                .unwrap_or(defaults.sense_resistance_microohm),
            divider_r1: config
                .divider_r1
                .filter(|&value| value > 0)
                .unwrap_or(defaults.divider_r1),
            divider_r2: config
                .divider_r2
                .filter(|&value| value > 0)
                .unwrap_or(defaults.divider_r2),
        }
    }

    /// Converts a raw POWER register value to μW.
    ///
    /// LSB = 31.25μW, truncated to whole μW on export.
    ///
    /// ```rust
    /// # use ltc2946::Calibration;
    /// let cal = Calibration::default();
    ///
    /// assert_eq!(cal.raw_power_to_uW(0), 0);
    /// assert_eq!(cal.raw_power_to_uW(1), 31);
    /// assert_eq!(cal.raw_power_to_uW(1000), 31_250);
    /// assert_eq!(cal.raw_power_to_uW(0xFF_FFFF), 524_287_968);
    /// ```
    #[allow(non_snake_case)]
    #[inline]
    pub fn raw_power_to_uW(&self, raw: u32) -> u32 {
        ((raw as u64 * 31_250) / 1_000) as u32
    }

    /// Converts a μW value to raw POWER register units. Not an exact inverse
    /// of [`Calibration::raw_power_to_uW`]; both directions truncate.
    ///
    /// ```rust
    /// # use ltc2946::Calibration;
    /// let cal = Calibration::default();
    ///
    /// assert_eq!(cal.uW_to_raw_power(31_250), 1000);
    /// assert_eq!(cal.uW_to_raw_power(1000), 32);
    /// assert_eq!(cal.uW_to_raw_power(31), 0);
    /// ```
    #[allow(non_snake_case)]
    #[inline]
    pub fn uW_to_raw_power(&self, microwatts: u32) -> u32 {
        ((microwatts as u64 * 1_000) / 31_250) as u32
    }

    /// Converts a raw ADIN register value to mV at the monitored rail.
    ///
    /// The pin sees 0.5mV per LSB; the divider compensation steps the pin
    /// voltage back up to the rail.
    ///
    /// ```rust
    /// # use ltc2946::Calibration;
    /// let cal = Calibration {
    ///     divider_r1: 1,
    ///     divider_r2: 1,
    ///     ..Default::default()
    /// };
    ///
    /// assert_eq!(cal.raw_adin_to_mV(0x100), 256);
    ///
    /// let cal = Calibration::default();
    ///
    /// assert_eq!(cal.raw_adin_to_mV(0x100), 128);
    /// assert_eq!(cal.raw_adin_to_mV(0xFFF), 2049);
    /// ```
    #[allow(non_snake_case)]
    #[inline]
    pub fn raw_adin_to_mV(&self, raw: u16) -> u32 {
        let pin_mv = (raw as u64 * 500) / 1_000;

        ((pin_mv * (self.divider_r1 as u64 + self.divider_r2 as u64)) / self.divider_r2 as u64)
            as u32
    }

    /// Converts a rail mV value to raw ADIN register units.
    ///
    /// The divider division runs first, then the LSB scaling; boards are
    /// calibrated against this exact rounding order.
    ///
    /// ```rust
    /// # use ltc2946::Calibration;
    /// let cal = Calibration {
    ///     divider_r1: 1,
    ///     divider_r2: 1,
    ///     ..Default::default()
    /// };
    ///
    /// assert_eq!(cal.mV_to_raw_adin(256), 0x100);
    ///
    /// let cal = Calibration::default();
    ///
    /// assert_eq!(cal.mV_to_raw_adin(128), 254);
    /// ```
    #[allow(non_snake_case)]
    #[inline]
    pub fn mV_to_raw_adin(&self, millivolts: u32) -> u32 {
        let pin_mv = (millivolts as u64 * self.divider_r2 as u64)
            / (self.divider_r1 as u64 + self.divider_r2 as u64);

        ((pin_mv * 1_000) / 500).min(u32::MAX as u64) as u32
    }

    /// Converts a raw ΔSENSE register value to mA through the shunt.
    ///
    /// ```rust
    /// # use ltc2946::Calibration;
    /// let cal = Calibration::default();
    ///
    /// assert_eq!(cal.raw_sense_to_mA(0x3E8), 25_000);
    ///
    /// let cal = Calibration {
    ///     sense_resistance_microohm: 25_000,
    ///     ..Default::default()
    /// };
    ///
    /// assert_eq!(cal.raw_sense_to_mA(1), 1);
    /// ```
    #[allow(non_snake_case)]
    #[inline]
    pub fn raw_sense_to_mA(&self, raw: u16) -> u32 {
        ((raw as u64 * 25_000) / self.sense_resistance_microohm as u64) as u32
    }

    /// Converts a mA value to raw ΔSENSE register units.
    ///
    /// ```rust
    /// # use ltc2946::Calibration;
    /// let cal = Calibration::default();
    ///
    /// assert_eq!(cal.mA_to_raw_sense(25_000), 0x3E8);
    /// assert_eq!(cal.mA_to_raw_sense(24), 0);
    /// ```
    #[allow(non_snake_case)]
    #[inline]
    pub fn mA_to_raw_sense(&self, milliamps: u32) -> u32 {
        ((milliamps as u64 * self.sense_resistance_microohm as u64) / 25_000)
            .min(u32::MAX as u64) as u32
    }

    /// Converts a raw register value to the attribute's export unit
    /// (μW, mV or mA).
    pub fn raw_to_physical(&self, kind: Kind, raw: u32) -> i64 {
        match kind {
            Kind::Power => self.raw_power_to_uW(raw) as i64,
            Kind::Voltage => self.raw_adin_to_mV(raw as u16) as i64,
            Kind::Current => self.raw_sense_to_mA(raw as u16) as i64,
        }
    }

    /// Converts an export-unit value back to raw register units. The
    /// registers are unsigned; negative inputs clamp to zero.
    pub fn physical_to_raw(&self, kind: Kind, value: i64) -> u32 {
        let value = value.clamp(0, u32::MAX as i64) as u32;

        match kind {
            Kind::Power => self.uW_to_raw_power(value),
            Kind::Voltage => self.mV_to_raw_adin(value),
            Kind::Current => self.mA_to_raw_sense(value),
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Kind {
    Power,
    Voltage,
    Current,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Variant {
    Input,
    Max,
    Min,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Access {
    ReadOnly,
    ReadWrite,
}

/// One entry of the fixed telemetry attribute table.
///
/// The nine attributes are the cross product of [`Kind`] and [`Variant`];
/// register address, field width and writability all derive from that pair.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Attribute {
    pub kind: Kind,
    pub variant: Variant,
}

impl Attribute {
    pub const ALL: [Self; 9] = [
        Self { kind: Kind::Power, variant: Variant::Input },
        Self { kind: Kind::Power, variant: Variant::Max },
        Self { kind: Kind::Power, variant: Variant::Min },
        Self { kind: Kind::Voltage, variant: Variant::Input },
        Self { kind: Kind::Voltage, variant: Variant::Max },
        Self { kind: Kind::Voltage, variant: Variant::Min },
        Self { kind: Kind::Current, variant: Variant::Input },
        Self { kind: Kind::Current, variant: Variant::Max },
        Self { kind: Kind::Current, variant: Variant::Min },
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|attribute| attribute.name() == name)
    }

    pub const fn name(self) -> &'static str {
        match (self.kind, self.variant) {
            (Kind::Power, Variant::Input) => "power_input",
            (Kind::Power, Variant::Max) => "power_max",
            (Kind::Power, Variant::Min) => "power_min",
            (Kind::Voltage, Variant::Input) => "in_input",
            (Kind::Voltage, Variant::Max) => "in_max",
            (Kind::Voltage, Variant::Min) => "in_min",
            (Kind::Current, Variant::Input) => "curr_input",
            (Kind::Current, Variant::Max) => "curr_max",
            (Kind::Current, Variant::Min) => "curr_min",
        }
    }

    pub const fn register(self) -> u8 {
        match (self.kind, self.variant) {
            (Kind::Power, Variant::Input) => descriptors::POWER,
            (Kind::Power, Variant::Max) => descriptors::MAX_POWER_THRESHOLD,
            (Kind::Power, Variant::Min) => descriptors::MIN_POWER_THRESHOLD,
            (Kind::Voltage, Variant::Input) => descriptors::ADIN,
            (Kind::Voltage, Variant::Max) => descriptors::MAX_ADIN_THRESHOLD,
            (Kind::Voltage, Variant::Min) => descriptors::MIN_ADIN_THRESHOLD,
            (Kind::Current, Variant::Input) => descriptors::DELTA_SENSE,
            (Kind::Current, Variant::Max) => descriptors::MAX_DELTA_SENSE_THRESHOLD,
            (Kind::Current, Variant::Min) => descriptors::MIN_DELTA_SENSE_THRESHOLD,
        }
    }

    pub const fn width(self) -> Width {
        match self.kind {
            Kind::Power => Width::TwentyFour,
            Kind::Voltage | Kind::Current => Width::Twelve,
        }
    }

    pub const fn access(self) -> Access {
        match self.variant {
            Variant::Input => Access::ReadOnly,
            Variant::Max | Variant::Min => Access::ReadWrite,
        }
    }
}

pub struct Ltc2946<I> {
    bus: ll::Ltc2946I2cInterface<I>,
    calibration: Calibration,
}

impl<I> Ltc2946<I> {
    pub fn new(i2c: I, config: CalibrationConfig) -> Self {
        Self {
            bus: ll::Ltc2946I2cInterface { i2c },
            calibration: Calibration::resolve(&config),
        }
    }

    pub fn calibration(&self) -> Calibration {
        self.calibration
    }

    pub fn into_inner(self) -> I {
        self.bus.i2c
    }

    fn adin_select() -> CtrlA {
        CtrlA::new(|reg| reg.voltage_monitor().write(VoltageMonitor::Adin))
    }
}

impl<I> Ltc2946<I>
where
    I: I2c,
{
    /// One-time bring-up: points the chip's voltage monitor at the ADIN pin.
    /// Voltage attributes read before this completes measure the wrong input.
    ///
    /// A failed write is logged and otherwise ignored, so the device still
    /// attaches on a glitched bus.
    pub fn init(&mut self) {
        if self.bus.write_register(Self::adin_select()).is_err() {
            warn!("Failed to select the ADIN voltage monitor");
        }
    }

    /// Reads one attribute and returns it in its export unit.
    pub fn read_attribute(&mut self, attribute: Attribute) -> Result<i64, Error<I::Error>> {
        let mut buffer = [0; 3];
        let buffer = &mut buffer[..attribute.width().bytes()];

        self.bus
            .read_block(attribute.register(), buffer)
            .map_err(Error::Bus)?;

        let raw = attribute.width().decode(buffer);
        Ok(self.calibration.raw_to_physical(attribute.kind, raw))
    }

    /// Writes one attribute from its export unit. The register is replaced
    /// whole; values past full scale saturate.
    pub fn write_attribute(
        &mut self,
        attribute: Attribute,
        value: i64,
    ) -> Result<(), Error<I::Error>> {
        if attribute.access() == Access::ReadOnly {
            return Err(Error::NotWritable);
        }

        let raw = self.calibration.physical_to_raw(attribute.kind, value);
        let mut buffer = [0; 3];
        let bytes = attribute.width().encode(raw, &mut buffer);

        self.bus
            .write_block(attribute.register(), bytes)
            .map_err(Error::Bus)
    }

    /// Reads the attribute with the given name as decimal text.
    pub fn show_attribute(&mut self, name: &str) -> Result<AttributeText, Error<I::Error>> {
        let attribute = Attribute::from_name(name).ok_or(Error::UnknownAttribute)?;
        let value = self.read_attribute(attribute)?;

        Ok(format_value(value))
    }

    /// Parses `text` as a decimal integer and writes the named attribute.
    /// Nothing reaches the bus unless the payload parses.
    pub fn store_attribute(&mut self, name: &str, text: &str) -> Result<(), Error<I::Error>> {
        let attribute = Attribute::from_name(name).ok_or(Error::UnknownAttribute)?;
        let value = parse_value(text).ok_or(Error::InvalidInput)?;

        self.write_attribute(attribute, value)
    }
}

impl<I> Ltc2946<I>
where
    I: AsyncI2c,
{
    pub async fn init_async(&mut self) {
        if self
            .bus
            .write_register_async(Self::adin_select())
            .await
            .is_err()
        {
            warn!("Failed to select the ADIN voltage monitor");
        }
    }

    pub async fn read_attribute_async(
        &mut self,
        attribute: Attribute,
    ) -> Result<i64, Error<I::Error>> {
        let mut buffer = [0; 3];
        let buffer = &mut buffer[..attribute.width().bytes()];

        self.bus
            .read_block_async(attribute.register(), buffer)
            .await
            .map_err(Error::Bus)?;

        let raw = attribute.width().decode(buffer);
        Ok(self.calibration.raw_to_physical(attribute.kind, raw))
    }

    pub async fn write_attribute_async(
        &mut self,
        attribute: Attribute,
        value: i64,
    ) -> Result<(), Error<I::Error>> {
        if attribute.access() == Access::ReadOnly {
            return Err(Error::NotWritable);
        }

        let raw = self.calibration.physical_to_raw(attribute.kind, value);
        let mut buffer = [0; 3];
        let bytes = attribute.width().encode(raw, &mut buffer);

        self.bus
            .write_block_async(attribute.register(), bytes)
            .await
            .map_err(Error::Bus)
    }

    pub async fn show_attribute_async(
        &mut self,
        name: &str,
    ) -> Result<AttributeText, Error<I::Error>> {
        let attribute = Attribute::from_name(name).ok_or(Error::UnknownAttribute)?;
        let value = self.read_attribute_async(attribute).await?;

        Ok(format_value(value))
    }

    pub async fn store_attribute_async(
        &mut self,
        name: &str,
        text: &str,
    ) -> Result<(), Error<I::Error>> {
        let attribute = Attribute::from_name(name).ok_or(Error::UnknownAttribute)?;
        let value = parse_value(text).ok_or(Error::InvalidInput)?;

        self.write_attribute_async(attribute, value).await
    }
}

fn parse_value(text: &str) -> Option<i64> {
    text.trim().parse().ok()
}

fn format_value(value: i64) -> AttributeText {
    let mut text = AttributeText::new();

    // the buffer outsizes the longest decimal i64
    let _ = uwrite!(&mut text, "{}", value);
    text
}

#[cfg(test)]
mod test {
    use embedded_hal::i2c::{self, ErrorType, Operation, SevenBitAddress};

    use super::*;

    const POWER_INPUT: Attribute = Attribute { kind: Kind::Power, variant: Variant::Input };
    const POWER_MAX: Attribute = Attribute { kind: Kind::Power, variant: Variant::Max };
    const IN_INPUT: Attribute = Attribute { kind: Kind::Voltage, variant: Variant::Input };
    const CURR_INPUT: Attribute = Attribute { kind: Kind::Current, variant: Variant::Input };
    const CURR_MAX: Attribute = Attribute { kind: Kind::Current, variant: Variant::Max };

    #[derive(Debug, PartialEq)]
    struct FakeBusError;

    impl i2c::Error for FakeBusError {
        fn kind(&self) -> i2c::ErrorKind {
            i2c::ErrorKind::Other
        }
    }

    /// Register-image double for the chip: `Write([reg])` sets the register
    /// pointer, a following `Write`/`Read` moves data at that address.
    struct FakeI2c {
        regs: [u8; 0x40],
        writes: usize,
        fail: bool,
    }

    impl FakeI2c {
        fn new() -> Self {
            Self {
                regs: [0; 0x40],
                writes: 0,
                fail: false,
            }
        }

        fn transact(&mut self, operations: &mut [Operation<'_>]) -> Result<(), FakeBusError> {
            if self.fail {
                return Err(FakeBusError);
            }

            let mut pointer = None;
            for operation in operations.iter_mut() {
                match operation {
                    Operation::Write(bytes) => match pointer {
                        None => pointer = Some(bytes[0] as usize),
                        Some(address) => {
                            self.writes += 1;
                            self.regs[address..address + bytes.len()].copy_from_slice(bytes);
                        }
                    },
                    Operation::Read(buffer) => {
                        let address = pointer.expect("read without a register pointer");
                        buffer.copy_from_slice(&self.regs[address..address + buffer.len()]);
                    }
                }
            }

            Ok(())
        }
    }

    impl ErrorType for FakeI2c {
        type Error = FakeBusError;
    }

    impl i2c::I2c for FakeI2c {
        fn transaction(
            &mut self,
            _address: SevenBitAddress,
            operations: &mut [Operation<'_>],
        ) -> Result<(), Self::Error> {
            self.transact(operations)
        }
    }

    impl embedded_hal_async::i2c::I2c for FakeI2c {
        async fn transaction(
            &mut self,
            _address: SevenBitAddress,
            operations: &mut [Operation<'_>],
        ) -> Result<(), Self::Error> {
            self.transact(operations)
        }
    }

    fn device(config: CalibrationConfig) -> Ltc2946<FakeI2c> {
        Ltc2946::new(FakeI2c::new(), config)
    }

    #[test]
    fn missing_config_keys_resolve_to_defaults() {
        let calibration = Calibration::resolve(&CalibrationConfig::default());

        assert_eq!(
            calibration,
            Calibration {
                sense_resistance_microohm: 1000,
                divider_r1: 1,
                divider_r2: 1000,
            }
        );
    }

    #[test]
    fn zero_config_values_resolve_to_defaults() {
        let calibration = Calibration::resolve(&CalibrationConfig {
            sense_resistance_microohm: Some(0),
            divider_r1: Some(4700),
            divider_r2: Some(0),
        });

        assert_eq!(
            calibration,
            Calibration {
                sense_resistance_microohm: 1000,
                divider_r1: 4700,
                divider_r2: 1000,
            }
        );
    }

    #[test]
    fn init_selects_the_adin_monitor() {
        let mut device = device(CalibrationConfig::default());
        device.init();

        assert_eq!(device.bus.i2c.regs[0x00], 0x08);
    }

    #[test]
    fn init_configuration_reads_back() {
        let mut device = device(CalibrationConfig::default());
        device.init();

        let ctrl: CtrlA = device.bus.read_register().unwrap();
        assert_eq!(ctrl.voltage_monitor().read(), Some(VoltageMonitor::Adin));
    }

    #[test]
    fn attach_survives_failed_channel_select() {
        let mut device = device(CalibrationConfig::default());
        device.bus.i2c.fail = true;
        device.init();

        device.bus.i2c.fail = false;
        device.bus.i2c.regs[0x05..0x08].copy_from_slice(&[0x00, 0x03, 0xE8]);

        assert_eq!(device.read_attribute(POWER_INPUT).unwrap(), 31_250);
    }

    #[test]
    fn power_input_converts_to_microwatts() {
        let mut device = device(CalibrationConfig::default());
        device.bus.i2c.regs[0x05..0x08].copy_from_slice(&[0x12, 0x34, 0x56]);

        assert_eq!(device.read_attribute(POWER_INPUT).unwrap(), 37_282_687);
    }

    #[test]
    fn power_round_trip_truncates() {
        #[rustfmt::skip]
        let table = [
            (31_250, 31_250),
            (1000, 1000),
            (123_456, 123_437),
            (31, 0),
        ];

        let mut device = device(CalibrationConfig::default());

        for (input, expected) in table {
            device.write_attribute(POWER_MAX, input).unwrap();
            assert_eq!(device.read_attribute(POWER_MAX).unwrap(), expected);
        }
    }

    #[test]
    fn voltage_scales_by_the_divider_ratio() {
        let mut device = device(CalibrationConfig {
            divider_r1: Some(1),
            divider_r2: Some(1),
            ..Default::default()
        });
        device.bus.i2c.regs[0x28..0x2A].copy_from_slice(&[0x10, 0x00]);

        assert_eq!(device.read_attribute(IN_INPUT).unwrap(), 256);
    }

    #[test]
    fn voltage_compensates_for_the_divider() {
        let mut device = device(CalibrationConfig::default());
        device.bus.i2c.regs[0x28..0x2A].copy_from_slice(&[0x10, 0x00]);

        assert_eq!(device.read_attribute(IN_INPUT).unwrap(), 128);
    }

    #[test]
    fn current_scales_by_the_sense_resistance() {
        let mut device = device(CalibrationConfig::default());
        device.bus.i2c.regs[0x14..0x16].copy_from_slice(&[0x3E, 0x80]);

        assert_eq!(device.read_attribute(CURR_INPUT).unwrap(), 25_000);
    }

    #[test]
    fn stored_values_land_left_justified_in_the_register() {
        let mut device = device(CalibrationConfig::default());
        device.store_attribute("curr_max", "25000").unwrap();

        assert_eq!(device.bus.i2c.regs[0x1A..0x1C], [0x3E, 0x80]);
        assert_eq!(device.read_attribute(CURR_MAX).unwrap(), 25_000);
    }

    #[test]
    fn stored_text_may_carry_whitespace() {
        let mut device = device(CalibrationConfig::default());
        device.store_attribute("power_max", " 31250\n").unwrap();

        assert_eq!(device.bus.i2c.regs[0x0E..0x11], [0x00, 0x03, 0xE8]);
    }

    #[test]
    fn negative_writes_clamp_to_zero() {
        let mut device = device(CalibrationConfig::default());
        device.bus.i2c.regs[0x1A..0x1C].copy_from_slice(&[0xFF, 0xF0]);

        device.store_attribute("curr_max", "-42").unwrap();

        assert_eq!(device.bus.i2c.regs[0x1A..0x1C], [0x00, 0x00]);
    }

    #[test]
    fn input_attributes_are_not_writable() {
        let mut device = device(CalibrationConfig::default());

        for name in ["power_input", "in_input", "curr_input"] {
            assert!(matches!(
                device.store_attribute(name, "1"),
                Err(Error::NotWritable)
            ));
        }
        assert!(matches!(
            device.write_attribute(CURR_INPUT, 1),
            Err(Error::NotWritable)
        ));
        assert_eq!(device.bus.i2c.writes, 0);
    }

    #[test]
    fn unknown_names_are_rejected() {
        let mut device = device(CalibrationConfig::default());

        assert!(matches!(
            device.show_attribute("temp_input"),
            Err(Error::UnknownAttribute)
        ));
        assert!(matches!(
            device.store_attribute("power1_max", "1"),
            Err(Error::UnknownAttribute)
        ));
    }

    #[test]
    fn malformed_payloads_never_reach_the_bus() {
        let mut device = device(CalibrationConfig::default());

        for text in ["12abc", "", "0x10", "1.5"] {
            assert!(matches!(
                device.store_attribute("power_max", text),
                Err(Error::InvalidInput)
            ));
        }
        assert_eq!(device.bus.i2c.writes, 0);
    }

    #[test]
    fn bus_errors_propagate_verbatim() {
        let mut device = device(CalibrationConfig::default());
        device.bus.i2c.fail = true;

        assert!(matches!(
            device.read_attribute(POWER_INPUT),
            Err(Error::Bus(FakeBusError))
        ));
        assert!(matches!(
            device.write_attribute(POWER_MAX, 1000),
            Err(Error::Bus(FakeBusError))
        ));
    }

    #[test]
    fn attribute_names_round_trip() {
        for attribute in Attribute::ALL {
            assert_eq!(Attribute::from_name(attribute.name()), Some(attribute));
        }
        assert_eq!(Attribute::from_name("power"), None);
    }

    #[test]
    fn shown_values_are_decimal_text() {
        let mut device = device(CalibrationConfig::default());
        device.bus.i2c.regs[0x14..0x16].copy_from_slice(&[0x3E, 0x80]);

        assert_eq!(device.show_attribute("curr_input").unwrap().as_str(), "25000");
    }

    #[test]
    fn async_dispatch_matches_sync() {
        use embassy_futures::block_on;

        let mut device = device(CalibrationConfig::default());

        block_on(device.init_async());
        assert_eq!(device.bus.i2c.regs[0x00], 0x08);

        device.bus.i2c.regs[0x14..0x16].copy_from_slice(&[0x3E, 0x80]);
        assert_eq!(block_on(device.read_attribute_async(CURR_INPUT)).unwrap(), 25_000);
        assert_eq!(
            block_on(device.show_attribute_async("curr_input")).unwrap().as_str(),
            "25000"
        );

        block_on(device.store_attribute_async("curr_max", "25000")).unwrap();
        assert_eq!(device.bus.i2c.regs[0x1A..0x1C], [0x3E, 0x80]);

        assert!(matches!(
            block_on(device.write_attribute_async(CURR_INPUT, 1)),
            Err(Error::NotWritable)
        ));
    }
}
