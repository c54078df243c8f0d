//! A device abstraction for Network Time Protocol (NTP) time synchronization over WiFi.
//!
//! The task fetches time only when asked ([`TimeSync::request`]) and reports back on a small
//! channel that the main loop drains without waiting ([`TimeSync::try_event`]). See
//! [`TimeSync`] for usage.

#![allow(clippy::future_not_send, reason = "single-threaded")]

use core::convert::Infallible;

use defmt::{info, warn};
use embassy_executor::Spawner;
use embassy_net::{Stack, dns, udp};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_sync::signal::Signal;
use embassy_time::Duration;
use static_cell::StaticCell;

use crate::Result;
use crate::settings::{ClockSettings, NtpServerName};
use crate::unix_seconds::UnixSeconds;
use crate::wifi::Wifi;

const NTP_PORT: u16 = 123;
const NTP_PACKET_SIZE: usize = 48;
const NTP_TIMEOUT: Duration = Duration::from_secs(5);
const EVENT_CAPACITY: usize = 4;

// ============================================================================
// Types
// ============================================================================

/// Events emitted by [`TimeSync`].
#[derive(Clone, Copy, Debug, defmt::Format)]
pub enum TimeSyncEvent {
    /// WiFi is joined and DHCP configured; the time source is reachable.
    NetworkReady,
    Success { unix_seconds: UnixSeconds },
    Failed(&'static str),
}

type TimeSyncRequests = Signal<CriticalSectionRawMutex, ()>;
type TimeSyncEvents = Channel<CriticalSectionRawMutex, TimeSyncEvent, EVENT_CAPACITY>;

/// Resources needed to construct a [`TimeSync`].
pub struct TimeSyncStatic {
    requests: TimeSyncRequests,
    events: TimeSyncEvents,
    time_sync_cell: StaticCell<TimeSync>,
}

// ============================================================================
// TimeSync Virtual Device
// ============================================================================

/// Device abstraction that fetches SNTP time on request.
///
/// # Example
///
/// ```no_run
/// # #![no_std]
/// # #![no_main]
/// # use panic_probe as _;
/// use ntp_led_clock::settings::ClockSettings;
/// use ntp_led_clock::time_sync::{TimeSync, TimeSyncEvent, TimeSyncStatic};
/// use ntp_led_clock::wifi::Wifi;
///
/// # async fn example(wifi: &'static Wifi, spawner: embassy_executor::Spawner) -> ntp_led_clock::Result<()> {
/// let settings = ClockSettings::default();
/// static TIME_SYNC_STATIC: TimeSyncStatic = TimeSync::new_static();
/// let time_sync = TimeSync::new(&TIME_SYNC_STATIC, wifi, &settings, spawner)?;
///
/// time_sync.request();
/// loop {
///     match time_sync.try_event() {
///         Some(TimeSyncEvent::Success { unix_seconds }) => {
///             defmt::info!("Time synced: {}", unix_seconds.as_i64());
///         }
///         Some(event) => defmt::info!("{:?}", event),
///         None => embassy_time::Timer::after_millis(100).await,
///     }
/// }
/// # }
/// ```
pub struct TimeSync {
    requests: &'static TimeSyncRequests,
    events: &'static TimeSyncEvents,
}

impl TimeSync {
    /// Create [`TimeSync`] resources.
    #[must_use]
    pub const fn new_static() -> TimeSyncStatic {
        TimeSyncStatic {
            requests: Signal::new(),
            events: Channel::new(),
            time_sync_cell: StaticCell::new(),
        }
    }

    /// Spawn the sync task. It waits for `wifi` and then serves requests against the
    /// settings' NTP server.
    ///
    /// # Errors
    ///
    /// Returns an error if the task cannot be spawned.
    pub fn new(
        time_sync_static: &'static TimeSyncStatic,
        wifi: &'static Wifi,
        settings: &ClockSettings,
        spawner: Spawner,
    ) -> Result<&'static Self> {
        let token = time_sync_loop(
            wifi,
            settings.ntp_server_name().clone(),
            &time_sync_static.requests,
            &time_sync_static.events,
        )?;
        spawner.spawn(token);
        Ok(time_sync_static.time_sync_cell.init(Self {
            requests: &time_sync_static.requests,
            events: &time_sync_static.events,
        }))
    }

    /// Ask for one fetch. Requests made while one is pending are merged.
    pub fn request(&self) {
        self.requests.signal(());
    }

    /// The next event, if one is waiting.
    #[must_use]
    pub fn try_event(&self) -> Option<TimeSyncEvent> {
        self.events.try_receive().ok()
    }
}

#[embassy_executor::task]
async fn time_sync_loop(
    wifi: &'static Wifi,
    ntp_server: NtpServerName,
    requests: &'static TimeSyncRequests,
    events: &'static TimeSyncEvents,
) -> ! {
    let err = inner_time_sync_loop(wifi, &ntp_server, requests, events)
        .await
        .unwrap_err();
    core::panic!("{err}");
}

async fn inner_time_sync_loop(
    wifi: &'static Wifi,
    ntp_server: &str,
    requests: &'static TimeSyncRequests,
    events: &'static TimeSyncEvents,
) -> Result<Infallible> {
    let stack = wifi.stack().await;
    info!("TimeSync received network stack");
    events.send(TimeSyncEvent::NetworkReady).await;

    loop {
        requests.wait().await;
        let event = match fetch_ntp_time(stack, ntp_server).await {
            Ok(unix_seconds) => {
                info!("Sync successful: unix_seconds={}", unix_seconds.as_i64());
                TimeSyncEvent::Success { unix_seconds }
            }
            Err(message) => {
                info!("Sync failed: {}", message);
                TimeSyncEvent::Failed(message)
            }
        };
        events.send(event).await;
    }
}

// ============================================================================
// Network - Network Time Protocol (NTP) Fetch
// ============================================================================

async fn fetch_ntp_time(
    stack: &Stack<'static>,
    ntp_server: &str,
) -> core::result::Result<UnixSeconds, &'static str> {
    use dns::DnsQueryType;
    use udp::UdpSocket;

    info!("Resolving NTP host {}...", ntp_server);
    let dns_result = stack
        .dns_query(ntp_server, DnsQueryType::A)
        .await
        .map_err(|e| {
            warn!("DNS lookup failed: {:?}", e);
            "DNS lookup failed"
        })?;
    let server_addr = dns_result.first().ok_or("No DNS results")?;

    let mut rx_meta = [udp::PacketMetadata::EMPTY; 1];
    let mut rx_buffer = [0; 128];
    let mut tx_meta = [udp::PacketMetadata::EMPTY; 1];
    let mut tx_buffer = [0; 128];
    let mut socket = UdpSocket::new(
        *stack,
        &mut rx_meta,
        &mut rx_buffer,
        &mut tx_meta,
        &mut tx_buffer,
    );

    socket.bind(0).map_err(|e| {
        warn!("Socket bind failed: {:?}", e);
        "Socket bind failed"
    })?;

    // LI=0, VN=3, Mode=3 (client)
    let mut ntp_request = [0u8; NTP_PACKET_SIZE];
    ntp_request[0] = 0x1B;

    info!("Sending NTP request to {}...", server_addr);
    socket
        .send_to(&ntp_request, (*server_addr, NTP_PORT))
        .await
        .map_err(|e| {
            warn!("NTP send failed: {:?}", e);
            "NTP send failed"
        })?;

    let mut response = [0u8; NTP_PACKET_SIZE];
    let (n, _from) = embassy_time::with_timeout(NTP_TIMEOUT, socket.recv_from(&mut response))
        .await
        .map_err(|_| "NTP receive timeout")?
        .map_err(|e| {
            warn!("NTP receive failed: {:?}", e);
            "NTP receive failed"
        })?;

    if n < NTP_PACKET_SIZE {
        warn!("NTP response too short: {} bytes", n);
        return Err("NTP response too short");
    }

    // Transmit timestamp, whole seconds (bytes 40-43, big-endian)
    let ntp_seconds = u32::from_be_bytes([response[40], response[41], response[42], response[43]]);
    UnixSeconds::from_ntp_seconds(ntp_seconds).ok_or("Invalid NTP timestamp")
}
