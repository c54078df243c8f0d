//! Pin assignment of the clock board.

use embassy_rp::Peri;
use embassy_rp::gpio::{self, Level};
use embassy_rp::peripherals::{DMA_CH0, FLASH, PIN_23, PIN_24, PIN_25, PIN_29, PIO0};

use crate::latched_display::LatchedDisplay;
use crate::output_array::OutputArray;

/// The CYW43 radio's pins and peripherals, handed whole to [`Wifi`](crate::wifi::Wifi).
pub struct WifiPeripherals {
    pub pin_23: Peri<'static, PIN_23>,
    pub pin_25: Peri<'static, PIN_25>,
    pub pio0: Peri<'static, PIO0>,
    pub pin_24: Peri<'static, PIN_24>,
    pub pin_29: Peri<'static, PIN_29>,
    pub dma_ch0: Peri<'static, DMA_CH0>,
}

pub struct Hardware {
    pub display: LatchedDisplay<'static>,
    /// Reset button to ground; reads low while pressed.
    pub button: gpio::Input<'static>,
    pub flash: Peri<'static, FLASH>,
    pub wifi: WifiPeripherals,
}

impl Default for Hardware {
    fn default() -> Self {
        let peripherals: embassy_rp::Peripherals =
            embassy_rp::init(embassy_rp::config::Config::default());

        // BCD weights 1, 2, 4, 8
        let data = OutputArray::new([
            gpio::Output::new(peripherals.PIN_2, Level::High),
            gpio::Output::new(peripherals.PIN_3, Level::High),
            gpio::Output::new(peripherals.PIN_4, Level::High),
            gpio::Output::new(peripherals.PIN_5, Level::High),
        ]);

        let enables = OutputArray::new([
            gpio::Output::new(peripherals.PIN_6, Level::High),
            gpio::Output::new(peripherals.PIN_7, Level::High),
            gpio::Output::new(peripherals.PIN_8, Level::High),
            gpio::Output::new(peripherals.PIN_9, Level::High),
        ]);

        let dot = gpio::Output::new(peripherals.PIN_10, Level::High);

        let button = gpio::Input::new(peripherals.PIN_13, gpio::Pull::Up);

        Self {
            display: LatchedDisplay::new(data, enables, dot),
            button,
            flash: peripherals.FLASH,
            wifi: WifiPeripherals {
                pin_23: peripherals.PIN_23,
                pin_25: peripherals.PIN_25,
                pio0: peripherals.PIO0,
                pin_24: peripherals.PIN_24,
                pin_29: peripherals.PIN_29,
                dma_ch0: peripherals.DMA_CH0,
            },
        }
    }
}
