//! WiFi client for the Raspberry Pi Pico W.
//!
//! Joins the network named by the build-time `WIFI_SSID`/`WIFI_PASS` and publishes the
//! DHCP-configured [`Stack`] once it is up. See [`Wifi`].

#![allow(clippy::future_not_send, reason = "single-threaded")]

use cyw43::JoinOptions;
use cyw43_pio::{DEFAULT_CLOCK_DIVIDER, PioSpi};
use defmt::info;
use embassy_executor::Spawner;
use embassy_net::{Config, Stack, StackResources};
use embassy_rp::gpio::{Level, Output};
use embassy_rp::peripherals::{DMA_CH0, PIO0};
use embassy_rp::pio::{InterruptHandler, Pio};
use embassy_rp::bind_interrupts;
use embassy_sync::once_lock::OnceLock;
use embassy_time::Timer;
use static_cell::StaticCell;

use crate::Result;
use crate::hardware::WifiPeripherals;

const WIFI_SSID: &str = env!("WIFI_SSID");
const WIFI_PASS: &str = env!("WIFI_PASS");

/// Resources needed to construct a [`Wifi`].
pub struct WifiStatic {
    stack: OnceLock<&'static Stack<'static>>,
    wifi_cell: StaticCell<Wifi>,
}

/// A device abstraction that joins WiFi in client mode and owns the network stack.
///
/// ```no_run
/// # #![no_std]
/// # #![no_main]
/// # use panic_probe as _;
/// use ntp_led_clock::hardware::Hardware;
/// use ntp_led_clock::wifi::{Wifi, WifiStatic};
///
/// # async fn example(spawner: embassy_executor::Spawner) -> ntp_led_clock::Result<()> {
/// let hardware = Hardware::default();
/// static WIFI_STATIC: WifiStatic = Wifi::new_static();
/// let wifi = Wifi::new(&WIFI_STATIC, hardware.wifi, spawner)?;
/// let stack = wifi.stack().await;
/// # let _ = stack;
/// # Ok(())
/// # }
/// ```
pub struct Wifi {
    stack: &'static OnceLock<&'static Stack<'static>>,
}

impl Wifi {
    /// Create [`Wifi`] resources.
    #[must_use]
    pub const fn new_static() -> WifiStatic {
        WifiStatic {
            stack: OnceLock::new(),
            wifi_cell: StaticCell::new(),
        }
    }

    /// Start the radio and the join loop in the background.
    ///
    /// # Errors
    ///
    /// Returns an error if the device task cannot be spawned.
    pub fn new(
        wifi_static: &'static WifiStatic,
        peripherals: WifiPeripherals,
        spawner: Spawner,
    ) -> Result<&'static Self> {
        let token = wifi_device_loop(peripherals, &wifi_static.stack, spawner)?;
        spawner.spawn(token);
        Ok(wifi_static.wifi_cell.init(Self {
            stack: &wifi_static.stack,
        }))
    }

    /// Wait until the network is joined and configured.
    pub async fn stack(&self) -> &'static Stack<'static> {
        *self.stack.get().await
    }
}

bind_interrupts!(struct Irqs {
    PIO0_IRQ_0 => InterruptHandler<PIO0>;
});

#[embassy_executor::task]
async fn wifi_device_loop(
    peripherals: WifiPeripherals,
    stack_cell: &'static OnceLock<&'static Stack<'static>>,
    spawner: Spawner,
) -> ! {
    let err = inner_wifi_device_loop(peripherals, stack_cell, spawner)
        .await
        .unwrap_err();
    core::panic!("{err}");
}

async fn inner_wifi_device_loop(
    peripherals: WifiPeripherals,
    stack_cell: &'static OnceLock<&'static Stack<'static>>,
    spawner: Spawner,
) -> Result<core::convert::Infallible> {
    info!("WiFi device initializing in client mode");

    let fw = cyw43_firmware::CYW43_43439A0;
    let clm = cyw43_firmware::CYW43_43439A0_CLM;

    let WifiPeripherals {
        pin_23,
        pin_25,
        pio0,
        pin_24,
        pin_29,
        dma_ch0,
    } = peripherals;
    let pwr = Output::new(pin_23, Level::Low);
    let cs = Output::new(pin_25, Level::High);
    let mut pio = Pio::new(pio0, Irqs);
    let spi = PioSpi::new(
        &mut pio.common,
        pio.sm0,
        DEFAULT_CLOCK_DIVIDER,
        pio.irq0,
        cs,
        pin_24,
        pin_29,
        dma_ch0,
    );

    static STATE: StaticCell<cyw43::State> = StaticCell::new();
    let state = STATE.init(cyw43::State::new());
    let (net_device, mut control, runner) = cyw43::new(state, pwr, spi, fw).await;
    spawner.spawn(wifi_task(runner)?);

    control.init(clm).await;
    control
        .set_power_management(cyw43::PowerManagementMode::PowerSave)
        .await;

    let config = Config::dhcpv4(Default::default());
    let seed = 0x4e54_505f_636c_6f63;

    static RESOURCES: StaticCell<StackResources<4>> = StaticCell::new();
    static STACK: StaticCell<Stack<'static>> = StaticCell::new();
    let (stack_val, runner) = embassy_net::new(
        net_device,
        config,
        RESOURCES.init(StackResources::<4>::new()),
        seed,
    );
    let stack = STACK.init(stack_val);
    spawner.spawn(net_task(runner)?);

    info!("Connecting to WiFi: {}", WIFI_SSID);
    let mut attempt: u32 = 0;
    loop {
        attempt = attempt.saturating_add(1);
        match control
            .join(WIFI_SSID, JoinOptions::new(WIFI_PASS.as_bytes()))
            .await
        {
            Ok(()) => break,
            Err(err) => {
                info!("Join attempt {} failed: {}", attempt, err.status);
                Timer::after_secs(1).await;
            }
        }
    }

    info!("WiFi connected! Waiting for DHCP...");
    stack.wait_config_up().await;
    if let Some(config) = stack.config_v4() {
        info!("IP Address: {}", config.address);
    }

    // Only this task initializes the cell.
    let _ = stack_cell.init(stack);

    loop {
        Timer::after_secs(3600).await;
    }
}

#[embassy_executor::task]
async fn wifi_task(
    runner: cyw43::Runner<'static, Output<'static>, PioSpi<'static, PIO0, 0, DMA_CH0>>,
) -> ! {
    runner.run().await
}

#[embassy_executor::task]
async fn net_task(mut runner: embassy_net::Runner<'static, cyw43::NetDriver<'static>>) -> ! {
    runner.run().await
}
