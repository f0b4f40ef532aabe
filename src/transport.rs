//! USB transport for the KL-G2.
//!
//! The printer is a plain bulk device: one OUT endpoint for frames,
//! one IN endpoint for responses, no interrupt traffic. Transfers
//! block without a timeout, matching the device's habit of sitting on
//! a response while the tape motor runs.

use std::time::Duration;

use log::{debug, info};
use rusb::{Context, Device, DeviceDescriptor, DeviceHandle, Direction, TransferType, UsbContext};

use crate::error::Error;

#[cfg(test)]
use crate::commands::{OP_CANCEL_JOB, PREJOB_READY, STATUS_READY};
#[cfg(test)]
use crate::frame::{ACK, STX};

/// Casio's USB vendor id.
pub const VENDOR_ID: u16 = 0x07CF;

/// Product id of the KL-G2.
pub const PRODUCT_ID: u16 = 0x4112;

/// Bulk endpoint buffer size, which is also the largest frame.
pub const ENDPOINT_SIZE: usize = 64;

/// Bidirectional frame link to the printer.
///
/// `send` puts every byte of `frame` on the wire; the framing layer has
/// already padded it to a legal transfer size, so a short write is a
/// hard failure. `receive` hands back the bytes of one inbound
/// transfer, however many arrived.
pub trait Transport {
    fn send(&mut self, frame: &[u8]) -> Result<(), Error>;
    fn receive(&mut self) -> Result<Vec<u8>, Error>;
}

#[derive(Debug, Clone, Copy)]
struct Endpoint {
    config: u8,
    iface: u8,
    setting: u8,
    address: u8,
}

/// Exclusive bulk link to the first KL-G2 on the bus.
pub struct UsbTransport {
    handle: DeviceHandle<Context>,
    endpoint_out: Endpoint,
    endpoint_in: Endpoint,
}

impl UsbTransport {
    /// Find, open and claim the printer.
    pub fn open() -> Result<Self, Error> {
        let mut context = Context::new()?;
        let (mut device, device_desc, mut handle) =
            Self::open_device(&mut context, VENDOR_ID, PRODUCT_ID)?;

        let endpoint_in = match Self::find_endpoint(
            &mut device,
            &device_desc,
            Direction::In,
            TransferType::Bulk,
        ) {
            Some(endpoint) => endpoint,
            None => return Err(Error::MissingEndpoint),
        };

        let endpoint_out = match Self::find_endpoint(
            &mut device,
            &device_desc,
            Direction::Out,
            TransferType::Bulk,
        ) {
            Some(endpoint) => endpoint,
            None => return Err(Error::MissingEndpoint),
        };

        // usblp tends to grab the printer before we do.
        handle.set_auto_detach_kernel_driver(true)?;
        let has_kernel_driver = handle
            .kernel_driver_active(endpoint_out.iface)
            .unwrap_or(false);
        info!("Kernel driver active: {}", has_kernel_driver);

        handle.set_active_configuration(endpoint_out.config)?;
        handle.claim_interface(endpoint_out.iface)?;
        handle.set_alternate_setting(endpoint_out.iface, endpoint_out.setting)?;

        Ok(UsbTransport {
            handle,
            endpoint_out,
            endpoint_in,
        })
    }

    fn open_device(
        context: &mut Context,
        vid: u16,
        pid: u16,
    ) -> Result<(Device<Context>, DeviceDescriptor, DeviceHandle<Context>), Error> {
        let devices = context.devices()?;

        if devices.is_empty() {
            debug!("Failed to read device list");
            return Err(Error::DeviceListNotReadable);
        }
        for device in devices.iter() {
            let device_desc = match device.device_descriptor() {
                Ok(d) => d,
                Err(err) => {
                    debug!("{:?}", err);
                    continue;
                }
            };

            if device_desc.vendor_id() == vid && device_desc.product_id() == pid {
                match device.open() {
                    Ok(handle) => return Ok((device, device_desc, handle)),
                    Err(err) => {
                        debug!("Failed to open device: {:?}", err);
                        continue;
                    }
                }
            }
        }
        Err(Error::DeviceOffline)
    }

    fn find_endpoint(
        device: &mut Device<Context>,
        device_desc: &DeviceDescriptor,
        direction: Direction,
        transfer_type: TransferType,
    ) -> Option<Endpoint> {
        for n in 0..device_desc.num_configurations() {
            let config_desc = match device.config_descriptor(n) {
                Ok(c) => c,
                Err(_) => continue,
            };
            for interface in config_desc.interfaces() {
                for interface_desc in interface.descriptors() {
                    for endpoint_desc in interface_desc.endpoint_descriptors() {
                        if endpoint_desc.direction() == direction
                            && endpoint_desc.transfer_type() == transfer_type
                        {
                            return Some(Endpoint {
                                config: config_desc.number(),
                                iface: interface_desc.interface_number(),
                                setting: interface_desc.setting_number(),
                                address: endpoint_desc.address(),
                            });
                        }
                    }
                }
            }
        }
        None
    }
}

impl Transport for UsbTransport {
    fn send(&mut self, frame: &[u8]) -> Result<(), Error> {
        debug!("> {:02X?}", frame);
        // Zero timeout means no timeout. The printer answers commands
        // only after the mechanics settle, which can take seconds.
        let wrote = self
            .handle
            .write_bulk(self.endpoint_out.address, frame, Duration::ZERO)?;
        if wrote != frame.len() {
            return Err(Error::IncompleteTransfer {
                wrote,
                expected: frame.len(),
            });
        }
        Ok(())
    }

    fn receive(&mut self) -> Result<Vec<u8>, Error> {
        let mut buf = [0u8; ENDPOINT_SIZE];
        let got = self
            .handle
            .read_bulk(self.endpoint_in.address, &mut buf, Duration::ZERO)?;
        debug!("< {:02X?}", &buf[..got]);
        Ok(buf[..got].to_vec())
    }
}

impl Drop for UsbTransport {
    fn drop(&mut self) {
        // Claimed in open(); hand it back on every exit path.
        if let Err(err) = self.handle.release_interface(self.endpoint_out.iface) {
            debug!("Failed to release interface: {:?}", err);
        }
    }
}

/// Scripted stand-in for a live printer.
///
/// Answers every command with its canned response. A test can swap the
/// answer for one command prefix to provoke a protocol failure, or make
/// `send` fail outright to provoke a transport failure.
#[cfg(test)]
pub struct FakePrinter {
    pub sent: Vec<Vec<u8>>,
    pub answer_with: Option<(&'static [u8], Vec<u8>)>,
    pub fail_send_on: Option<&'static [u8]>,
    pending: Option<Vec<u8>>,
}

#[cfg(test)]
impl FakePrinter {
    pub fn new() -> Self {
        FakePrinter {
            sent: Vec::new(),
            answer_with: None,
            fail_send_on: None,
            pending: None,
        }
    }

    pub fn cancels_sent(&self) -> usize {
        self.sent
            .iter()
            .filter(|frame| frame.as_slice() == [OP_CANCEL_JOB])
            .count()
    }

    fn respond_to(frame: &[u8]) -> Option<Vec<u8>> {
        if frame.starts_with(&[STX, 0x1D]) {
            Some(STATUS_READY.to_vec())
        } else if frame.starts_with(&[STX, 0x82]) {
            Some(PREJOB_READY.to_vec())
        } else if frame.starts_with(&[STX, 0x1A]) {
            Some(vec![0x02, 0x80, 0x02, 0x00, 0x83])
        } else if frame == [OP_CANCEL_JOB] {
            None
        } else {
            Some(vec![ACK])
        }
    }
}

#[cfg(test)]
impl Transport for FakePrinter {
    fn send(&mut self, frame: &[u8]) -> Result<(), Error> {
        if let Some(prefix) = self.fail_send_on {
            if frame.starts_with(prefix) {
                return Err(rusb::Error::Pipe.into());
            }
        }
        self.sent.push(frame.to_vec());
        self.pending = match &self.answer_with {
            Some((prefix, response)) if frame.starts_with(prefix) => Some(response.clone()),
            _ => Self::respond_to(frame),
        };
        Ok(())
    }

    fn receive(&mut self) -> Result<Vec<u8>, Error> {
        Ok(self.pending.take().unwrap_or_default())
    }
}
