//! Wireless broadcast link: a BLE peripheral exposing the Nordic UART Service
//!
//! The device advertises under its configured name. Once a central connects,
//! every record the sampler publishes to [`BROADCAST_QUEUE`] is sent as one
//! notification on the NUS TX characteristic. Writes to the RX
//! characteristic are accepted and ignored; the link is one-way.
//!
//! After a disconnect the peripheral goes back to advertising, which is the
//! link's own connection handling and not a retry of anything the sampler did.

use bt_hci::controller::ExternalController;
use embassy_futures::select::{Either, select};
use esp_radio::ble::controller::BleConnector;
use log::{error, info, warn};
use trouble_host::prelude::*;

use gsr_core::broadcast::BROADCAST_QUEUE;
use gsr_core::record::RECORD_CAPACITY;

const CONNECTIONS_MAX: usize = 1;

/// Signal channel plus ATT
const L2CAP_CHANNELS_MAX: usize = 2;

/// HCI command slots for the external controller
const HCI_SLOTS: usize = 20;

/// Notification payload at the default ATT MTU (23 - 3)
const NOTIFY_CAPACITY: usize = 20;

const _: () = assert!(RECORD_CAPACITY <= NOTIFY_CAPACITY);

/// Static random address; the top two bits mark it as static
const DEVICE_ADDRESS: [u8; 6] = [0x47, 0x53, 0x52, 0x00, 0x32, 0xE5];

/// 6e400001-b5a3-f393-e0a9-e50e24dcca9e, little-endian for advertising
const NUS_SERVICE_UUID_LE: [u8; 16] = [
    0x9e, 0xca, 0xdc, 0x24, 0x0e, 0xe5, 0xa9, 0xe0, 0x93, 0xf3, 0xa3, 0xb5, 0x01, 0x00, 0x40, 0x6e,
];

type UartValue = trouble_heapless::Vec<u8, NOTIFY_CAPACITY>;

#[gatt_server]
struct GsrServer {
    uart: NordicUartService,
}

#[gatt_service(uuid = "6e400001-b5a3-f393-e0a9-e50e24dcca9e")]
struct NordicUartService {
    /// Device to central
    #[characteristic(uuid = "6e400003-b5a3-f393-e0a9-e50e24dcca9e", notify)]
    tx: UartValue,
    /// Central to device (unused)
    #[characteristic(uuid = "6e400002-b5a3-f393-e0a9-e50e24dcca9e", write, write_without_response)]
    rx: UartValue,
}

/// Runs the BLE host for the lifetime of the device.
///
/// Ends only if the GATT server cannot be built or advertising fails; the
/// sampler keeps running either way and its records are dropped.
#[embassy_executor::task]
pub async fn broadcast_task(connector: BleConnector<'static>, device_name: &'static str) {
    let controller: ExternalController<_, HCI_SLOTS> = ExternalController::new(connector);
    let address = Address::random(DEVICE_ADDRESS);
    info!("[ble] address {:?}", address);

    let mut resources: HostResources<DefaultPacketPool, CONNECTIONS_MAX, L2CAP_CHANNELS_MAX> =
        HostResources::new();
    let stack = trouble_host::new(controller, &mut resources).set_random_address(address);
    let Host {
        mut peripheral,
        runner,
        ..
    } = stack.build();

    let server = match GsrServer::new_with_config(GapConfig::Peripheral(PeripheralConfig {
        name: device_name,
        appearance: &appearance::sensor::GENERIC_SENSOR,
    })) {
        Ok(server) => server,
        Err(e) => {
            error!("[ble] failed to build GATT server: {:?}", e);
            return;
        }
    };

    let _ = select(
        run_host(runner),
        serve(device_name, &mut peripheral, &server),
    )
    .await;

    BROADCAST_QUEUE.set_connected(false);
    error!("[ble] link stopped, records will be dropped");
}

async fn run_host<C: Controller, P: PacketPool>(mut runner: Runner<'_, C, P>) {
    loop {
        if let Err(e) = runner.run().await {
            error!("[ble] host runner error: {:?}", e);
        }
    }
}

/// Advertise, stream to one central until it leaves, repeat.
async fn serve<'values, C: Controller>(
    name: &'values str,
    peripheral: &mut Peripheral<'values, C, DefaultPacketPool>,
    server: &GsrServer<'values>,
) {
    loop {
        info!("[ble] advertising as '{}'", name);
        let conn = match advertise(name, peripheral, server).await {
            Ok(conn) => conn,
            Err(e) => {
                error!("[ble] advertising failed: {:?}", e);
                return;
            }
        };

        info!("[ble] central connected");
        BROADCAST_QUEUE.set_connected(true);
        stream_records(server, &conn).await;
        BROADCAST_QUEUE.set_connected(false);
    }
}

async fn advertise<'values, 'server, C: Controller>(
    name: &'values str,
    peripheral: &mut Peripheral<'values, C, DefaultPacketPool>,
    server: &'server GsrServer<'values>,
) -> Result<GattConnection<'values, 'server, DefaultPacketPool>, BleHostError<C::Error>> {
    let mut adv_data = [0; 31];
    let adv_len = AdStructure::encode_slice(
        &[
            AdStructure::Flags(LE_GENERAL_DISCOVERABLE | BR_EDR_NOT_SUPPORTED),
            AdStructure::CompleteLocalName(name.as_bytes()),
        ],
        &mut adv_data[..],
    )?;

    let mut scan_data = [0; 31];
    let scan_len = AdStructure::encode_slice(
        &[AdStructure::ServiceUuids128(&[NUS_SERVICE_UUID_LE])],
        &mut scan_data[..],
    )?;

    let advertiser = peripheral
        .advertise(
            &Default::default(),
            Advertisement::ConnectableScannableUndirected {
                adv_data: &adv_data[..adv_len],
                scan_data: &scan_data[..scan_len],
            },
        )
        .await?;

    let conn = advertiser.accept().await?.with_attribute_server(server)?;
    Ok(conn)
}

/// Forward queued records as notifications until the central disconnects.
async fn stream_records<P: PacketPool>(server: &GsrServer<'_>, conn: &GattConnection<'_, '_, P>) {
    let tx = server.uart.tx;

    loop {
        match select(conn.next(), BROADCAST_QUEUE.receive()).await {
            Either::First(GattConnectionEvent::Disconnected { reason }) => {
                info!("[ble] central disconnected: {:?}", reason);
                return;
            }
            Either::First(GattConnectionEvent::Gatt { event }) => match event.accept() {
                Ok(reply) => reply.send().await,
                Err(e) => warn!("[ble] failed to accept GATT event: {:?}", e),
            },
            Either::First(_) => {}
            Either::Second(line) => {
                let mut value = UartValue::new();
                // Fits: checked against RECORD_CAPACITY at compile time
                let _ = value.extend_from_slice(line.as_bytes());

                if let Err(e) = tx.notify(conn, &value).await {
                    warn!("[ble] notify failed: {:?}", e);
                }
            }
        }
    }
}
