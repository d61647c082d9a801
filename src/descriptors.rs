use device_descriptor::*;

// Telemetry registers. POWER is three bytes, everything else two; the
// max/min threshold registers are the writable pair of each input register.
pub const POWER: u8 = 0x05;
pub const MAX_POWER_THRESHOLD: u8 = 0x0E;
pub const MIN_POWER_THRESHOLD: u8 = 0x11;

pub const DELTA_SENSE: u8 = 0x14;
pub const MAX_DELTA_SENSE_THRESHOLD: u8 = 0x1A;
pub const MIN_DELTA_SENSE_THRESHOLD: u8 = 0x1C;

pub const ADIN: u8 = 0x28;
pub const MAX_ADIN_THRESHOLD: u8 = 0x2E;
pub const MIN_ADIN_THRESHOLD: u8 = 0x30;

device! {
    CtrlA(addr = 0x00, default = 0x00) {
        adin_reference(pos = 7, width = 1): AdinReference {
            Ground = 0,
            Intvcc = 1
        },
        offset_calibration(pos = 5, width = 2): OffsetCalibration {
            EveryConversion = 0,
            Every16Conversions = 1,
            Every128Conversions = 2,
            Once = 3
        },
        voltage_monitor(pos = 3, width = 2): VoltageMonitor {
            SensePlus = 0,
            Adin = 1,
            Vdd = 2
        },
        channel_config(pos = 0, width = 3): ChannelConfig {
            AlternateVoltageCurrent = 0,
            VoltageOnly = 1,
            CurrentOnly = 2
        }
    }
}
