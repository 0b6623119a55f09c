#![no_std]
#![no_main]
#![deny(
    clippy::mem_forget,
    reason = "mem::forget is generally not safe to do with esp_hal types, especially those \
    holding buffers for the duration of a data transfer."
)]
#![deny(clippy::large_stack_frames)]

use embassy_executor::Spawner;
use esp_hal::clock::CpuClock;
use esp_hal::timer::timg::TimerGroup;
use esp_radio::ble::controller::BleConnector;
use log::info;
use static_cell::StaticCell;

use gsr_core::broadcast::{BROADCAST_QUEUE, QueuedBroadcast};
use gsr_core::config::SamplerConfig;
use gsr_core::sampling::Sampler;
use gsr_firmware::{ble, hardware};

/// Set by the build script, from `.env` or the environment
const DEVICE_NAME: &str = env!("GSR_DEVICE_NAME");

#[panic_handler]
fn panic(info: &core::panic::PanicInfo) -> ! {
    rtt_target::rprintln!("PANIC: {}", info);
    loop {}
}

// This creates a default app-descriptor required by the esp-idf bootloader.
// For more information see: <https://docs.espressif.com/projects/esp-idf/en/stable/esp32/api-reference/system/app_image_format.html#application-description>
esp_bootloader_esp_idf::esp_app_desc!();

#[allow(
    clippy::large_stack_frames,
    reason = "it's not unusual to allocate larger buffers etc. in main"
)]
#[esp_rtos::main]
async fn main(spawner: Spawner) -> ! {
    rtt_target::rtt_init_log!();

    let config = esp_hal::Config::default().with_cpu_clock(CpuClock::max());
    let peripherals = esp_hal::init(config);

    // The BLE controller allocates its buffers from this heap
    esp_alloc::heap_allocator!(size: 72 * 1024);

    let timg0 = TimerGroup::new(peripherals.TIMG0);
    esp_rtos::start(timg0.timer0);

    info!("Embassy initialized!");

    let sampler_config = SamplerConfig::default().with_device_name(DEVICE_NAME);

    // 1. Wired diagnostic channel
    let diagnostic = hardware::init_diagnostic_uart(
        peripherals.UART0,
        peripherals.GPIO1,
        peripherals.GPIO3,
        sampler_config.diagnostic_baud_rate,
    );

    // 2. Wireless broadcast channel
    static RADIO: StaticCell<esp_radio::Controller<'static>> = StaticCell::new();
    let radio = RADIO.init(esp_radio::init().expect("Failed to initialize radio controller"));
    let connector = BleConnector::new(radio, peripherals.BT, Default::default())
        .expect("Failed to initialize BLE controller");
    spawner
        .spawn(ble::broadcast_task(connector, DEVICE_NAME))
        .expect("Failed to spawn BLE task");

    // 3. Analog inputs
    let (first, second) =
        hardware::init_gsr_inputs(peripherals.ADC1, peripherals.GPIO34, peripherals.GPIO35);

    let mut sampler = Sampler::new(
        sampler_config,
        first,
        second,
        diagnostic,
        QueuedBroadcast::new(&BROADCAST_QUEUE),
        embassy_time::Delay,
    )
    .expect("Invalid sampler configuration");

    // Runs until power loss or reset; any error halts the device
    match sampler.run().await {
        Ok(never) => match never {},
        Err(e) => panic!("Sampling stopped: {}", e),
    }
}
