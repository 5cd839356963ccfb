//! High-level sensor interface

use byteorder::{BigEndian, ByteOrder};
use bytes::Bytes;
use tracing::{debug, info, trace, warn};

use fpuart_core::{
    bulk::{self, BulkReader},
    constants::{MODULE_OK, TEMPLATE_READ_SEED},
    ChecksumPolicy, Command, Packet, Session, SessionState, Status,
};
use fpuart_transport::Transport;
use fpuart_types::{
    BufferKind, CharBuffer, LedColor, LedMode, MatchResult, SystemParameter, SystemParameters,
    TemplateIndex,
};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::reply::Reply;

/// Fingerprint sensor
///
/// One request/response exchange at a time: every operation takes
/// `&mut self`, so commands cannot interleave on the shared link. Share a
/// sensor between tasks behind a mutex.
///
/// # Examples
///
/// ```no_run
/// use fpuart::{Config, Sensor};
/// use fpuart_transport::TcpTransport;
///
/// #[tokio::main]
/// async fn main() -> fpuart::Result<()> {
///     let mut transport = TcpTransport::new("192.168.1.50", 2000);
///     transport.connect().await?;
///
///     let mut sensor = Sensor::connect(transport, Config::default()).await?;
///     println!("{}", sensor.count_templates().await?.value.unwrap_or(0));
///
///     sensor.close().await?;
///     Ok(())
/// }
/// ```
pub struct Sensor {
    transport: Box<dyn Transport>,
    session: Session,
    policy: ChecksumPolicy,
    params: Option<SystemParameters>,
}

impl Sensor {
    /// Verify the password and read system parameters
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - The link fails or a reply is malformed
    /// - The sensor rejects the password (`PasswordRejected`)
    /// - System parameters cannot be read (`CommandFailed`)
    ///
    /// There is no retry; build a new sensor to try again.
    pub async fn connect(transport: impl Transport + 'static, config: Config) -> Result<Self> {
        let mut sensor = Self {
            transport: Box::new(transport),
            session: Session::new(config.address, config.password),
            policy: config.checksum,
            params: None,
        };

        info!("Connecting to sensor on {}...", sensor.transport.describe());

        sensor.handshake().await?;
        let params = sensor.refresh_parameters().await?;

        info!("Connected ({})", params);

        Ok(sensor)
    }

    /// Session handle (address, password, link state)
    pub fn session(&self) -> Session {
        self.session.clone()
    }

    /// Check if verified and in step
    pub fn is_ready(&self) -> bool {
        self.session.is_ready() && self.transport.is_open()
    }

    /// Last system parameters read from the sensor
    pub fn parameters(&self) -> Option<&SystemParameters> {
        self.params.as_ref()
    }

    /// Re-run the password handshake after the link went out of step
    pub async fn resync(&mut self) -> Result<()> {
        if self.session.is_ready() {
            return Ok(());
        }

        warn!("Resynchronizing with sensor on {}...", self.transport.describe());
        self.handshake().await
    }

    /// Close the transport
    pub async fn close(&mut self) -> Result<()> {
        info!("Closing sensor on {}...", self.transport.describe());

        self.transport.close().await?;
        self.session.reset();

        Ok(())
    }

    /// Send the handshake password (`VfyPwd`)
    pub async fn verify_password(&mut self) -> Result<Status> {
        let password = self.session.password();
        let reply = self.exchange(Command::VerifyPassword, &password).await?;
        reply.status().map_err(Error::from)
    }

    /// Read the system parameters and refresh the cached copy
    pub async fn read_system_parameters(&mut self) -> Result<Reply<SystemParameters>> {
        let reply = self.execute(Command::ReadSysParam, &[]).await?;
        let status = reply.status()?;
        if !status.is_ok() {
            return Ok(Reply::failed(status));
        }

        let params = SystemParameters::parse(reply.body())?;
        self.params = Some(params);

        Ok(Reply::ok(params))
    }

    /// Read the system parameters, failing on a non-OK status
    ///
    /// Operations that depend on the library capacity call this first so the
    /// capacity is current when the command is issued.
    pub async fn refresh_parameters(&mut self) -> Result<SystemParameters> {
        let reply = self.read_system_parameters().await?;
        match reply.value {
            Some(params) => Ok(params),
            None => Err(Error::CommandFailed {
                command: Command::ReadSysParam,
                status: reply.status,
            }),
        }
    }

    /// Write one system parameter
    ///
    /// On success the cached baud rate, security level or packet size is
    /// updated without another round trip.
    pub async fn set_system_parameter(&mut self, param: SystemParameter, value: u8) -> Result<Status> {
        let status = self.simple(Command::SetSysParam, &[param.id(), value]).await?;

        if status.is_ok() {
            if let Some(params) = self.params.as_mut() {
                params.apply(param, value)?;
            }
        }

        Ok(status)
    }

    /// Capture a finger image into the image buffer
    pub async fn get_image(&mut self) -> Result<Status> {
        self.simple(Command::GetImage, &[]).await
    }

    /// Extract features from the image buffer into a char buffer
    pub async fn convert_image(&mut self, slot: CharBuffer) -> Result<Status> {
        self.simple(Command::Image2Tz, &[slot.id()]).await
    }

    /// Fuse char buffers 1 and 2 into one model
    pub async fn create_model(&mut self) -> Result<Status> {
        self.simple(Command::RegModel, &[]).await
    }

    /// Compare char buffers 1 and 2, returning the confidence score
    pub async fn compare_templates(&mut self) -> Result<Reply<u16>> {
        let reply = self.execute(Command::Compare, &[]).await?;
        let status = reply.status()?;
        if !status.is_ok() {
            return Ok(Reply::failed(status));
        }

        Ok(Reply::ok(read_word(&reply, 0)?))
    }

    /// Store a char buffer into the library at `location`
    pub async fn store_model(&mut self, location: u16, slot: CharBuffer) -> Result<Status> {
        let [hi, lo] = location.to_be_bytes();
        self.simple(Command::Store, &[slot.id(), hi, lo]).await
    }

    /// Load the template at `location` into a char buffer
    pub async fn load_model(&mut self, location: u16, slot: CharBuffer) -> Result<Status> {
        let [hi, lo] = location.to_be_bytes();
        self.simple(Command::Load, &[slot.id(), hi, lo]).await
    }

    /// Delete the template at `location`
    pub async fn delete_model(&mut self, location: u16) -> Result<Status> {
        self.delete_models(location, 1).await
    }

    /// Delete `count` consecutive templates starting at `location`
    pub async fn delete_models(&mut self, location: u16, count: u16) -> Result<Status> {
        let [loc_hi, loc_lo] = location.to_be_bytes();
        let [cnt_hi, cnt_lo] = count.to_be_bytes();
        self.simple(Command::Delete, &[loc_hi, loc_lo, cnt_hi, cnt_lo]).await
    }

    /// Delete every template in the library
    pub async fn empty_library(&mut self) -> Result<Status> {
        warn!("Emptying template library...");
        self.simple(Command::Empty, &[]).await
    }

    /// Number of stored templates
    pub async fn count_templates(&mut self) -> Result<Reply<u16>> {
        let reply = self.execute(Command::TemplateCount, &[]).await?;
        let status = reply.status()?;
        if !status.is_ok() {
            return Ok(Reply::failed(status));
        }

        Ok(Reply::ok(read_word(&reply, 0)?))
    }

    /// Read which library slots are occupied
    ///
    /// Refreshes the system parameters, then reads one 256-slot bitmap page
    /// per `ceil(library_size / 256)`. A failing page does not override an
    /// earlier successful one: the reported status is that of the last
    /// successful page, or `ReadTemplateFail` if none succeeded.
    pub async fn read_template_index(&mut self) -> Result<Reply<TemplateIndex>> {
        let params = self.refresh_parameters().await?;
        let pages = params.index_pages();

        let mut index = TemplateIndex::new();
        let mut status = Status::from(TEMPLATE_READ_SEED);

        for page in 0..pages {
            // library_size is a u16, so there are at most 256 pages
            let page = page as u8;
            let reply = self.execute(Command::TemplateRead, &[page]).await?;
            let page_status = reply.status()?;

            if page_status.is_ok() {
                index.merge_page(page, reply.body());
                status = page_status;
            } else {
                debug!(page, status = %page_status, "Index page failed, keeping previous status");
            }
        }

        debug!(pages, templates = index.len(), status = %status, "Template index read");

        if status.is_ok() {
            Ok(Reply::ok(index))
        } else {
            Ok(Reply::failed(status))
        }
    }

    /// High-speed search of char buffer 1 across the whole library
    pub async fn fast_search(&mut self) -> Result<Reply<MatchResult>> {
        self.search_with(Command::HiSpeedSearch).await
    }

    /// Exhaustive search of char buffer 1 across the whole library
    pub async fn search(&mut self) -> Result<Reply<MatchResult>> {
        self.search_with(Command::Search).await
    }

    async fn search_with(&mut self, command: Command) -> Result<Reply<MatchResult>> {
        let capacity = self.refresh_parameters().await?.library_size;
        let [cap_hi, cap_lo] = capacity.to_be_bytes();

        let reply = self
            .execute(command, &[CharBuffer::One.id(), 0x00, 0x00, cap_hi, cap_lo])
            .await?;
        let status = reply.status()?;
        if !status.is_ok() {
            return Ok(Reply::failed(status));
        }

        let found = MatchResult {
            template_id: read_word(&reply, 0)?,
            confidence: read_word(&reply, 2)?,
        };
        debug!(%found, "Search matched");

        Ok(Reply::ok(found))
    }

    /// Upload the image buffer or a char buffer from the sensor
    ///
    /// `slot` is ignored for [`BufferKind::Image`].
    pub async fn upload(&mut self, kind: BufferKind, slot: CharBuffer) -> Result<Reply<Bytes>> {
        let status = match kind {
            BufferKind::Image => self.simple(Command::UploadImage, &[]).await?,
            BufferKind::Character => self.simple(Command::Upload, &[slot.id()]).await?,
        };
        if !status.is_ok() {
            return Ok(Reply::failed(status));
        }

        let data = self.receive_bulk().await?;
        debug!("Uploaded {} bytes from {} buffer", data.len(), kind);

        Ok(Reply::ok(data))
    }

    /// Download an image or template into the sensor
    ///
    /// The data is split by the negotiated packet size; the final chunk is
    /// always sent as EndData. `slot` is ignored for [`BufferKind::Image`].
    pub async fn download(&mut self, kind: BufferKind, slot: CharBuffer, data: &[u8]) -> Result<Status> {
        let status = match kind {
            BufferKind::Image => self.simple(Command::DownloadImage, &[]).await?,
            BufferKind::Character => self.simple(Command::Download, &[slot.id()]).await?,
        };
        if !status.is_ok() {
            return Ok(status);
        }

        self.send_bulk(data).await?;
        debug!("Downloaded {} bytes to {} buffer", data.len(), kind);

        Ok(status)
    }

    /// Restart the module
    ///
    /// After an OK status the module sends one ready byte (0x55); anything
    /// else fails with `HandshakeMissing`.
    pub async fn soft_reset(&mut self) -> Result<Status> {
        let status = self.simple(Command::SoftReset, &[]).await?;
        if !status.is_ok() {
            return Ok(status);
        }

        let handshake = self.transport.read_exact(1).await.map_err(Error::from);
        let received = self.track(handshake)?[0];
        if received != MODULE_OK {
            return self.track(Err(Error::HandshakeMissing { received }));
        }

        info!("Sensor reset");
        Ok(status)
    }

    /// Configure the LED ring
    pub async fn set_led(&mut self, color: LedColor, mode: LedMode, speed: u8, cycles: u8) -> Result<Status> {
        self.simple(Command::SetAura, &[mode.code(), speed, color.code(), cycles])
            .await
    }

    /// Ask the module whether it is operating normally
    pub async fn check_module(&mut self) -> Result<()> {
        let reply = self.execute(Command::GetEcho, &[]).await?;
        let received = reply.payload.first().copied().unwrap_or_default();

        if received != MODULE_OK {
            return Err(Error::ModuleNotReady { received });
        }
        Ok(())
    }

    // Helper methods

    async fn handshake(&mut self) -> Result<()> {
        let status = self.verify_password().await?;
        if !status.is_ok() {
            warn!("Password rejected: {}", status);
            return Err(Error::PasswordRejected(status));
        }

        self.session.verify()?;
        debug!("Password verified");
        Ok(())
    }

    fn ensure_ready(&self) -> Result<()> {
        match self.session.state() {
            SessionState::Verified => Ok(()),
            SessionState::Desynchronized => Err(Error::Desynchronized),
            SessionState::Unverified => Err(Error::Core(fpuart_core::Error::InvalidSessionState(
                "password not verified".into(),
            ))),
        }
    }

    /// Mark the session desynchronized when `result` leaves the link out of step
    fn track<T>(&self, result: Result<T>) -> Result<T> {
        if let Err(e) = &result {
            if e.requires_resync() {
                warn!("Session desynchronized: {}", e);
                self.session.desynchronize();
            }
        }
        result
    }

    async fn simple(&mut self, command: Command, params: &[u8]) -> Result<Status> {
        let reply = self.execute(command, params).await?;
        reply.status().map_err(Error::from)
    }

    async fn execute(&mut self, command: Command, params: &[u8]) -> Result<Packet> {
        self.ensure_ready()?;
        self.exchange(command, params).await
    }

    /// One command frame out, one Ack frame of the command's fixed length back
    async fn exchange(&mut self, command: Command, params: &[u8]) -> Result<Packet> {
        let result = self.round_trip(command, params).await;
        let reply = self.track(result)?;

        debug!(
            command = %command,
            status = ?reply.payload.first().map(|code| Status::from(*code)),
            "Command completed"
        );

        Ok(reply)
    }

    async fn round_trip(&mut self, command: Command, params: &[u8]) -> Result<Packet> {
        let packet = Packet::command(self.session.address(), command, params)?;
        self.send_packet(&packet).await?;

        let buf = self.transport.read_exact(command.reply_len()).await?;
        let reply = Packet::decode_ack(&buf, self.session.address(), self.policy)?;

        trace!("Received: {:?}", reply);

        Ok(reply)
    }

    async fn send_packet(&mut self, packet: &Packet) -> Result<()> {
        trace!("Sending: {:?}", packet);

        let data = packet.encode();
        self.transport.write(&data).await?;

        Ok(())
    }

    async fn receive_bulk(&mut self) -> Result<Bytes> {
        let result = self.read_stream().await;
        self.track(result)
    }

    async fn read_stream(&mut self) -> Result<Bytes> {
        let mut reader = BulkReader::new(self.session.address(), self.policy);

        loop {
            let head = self.transport.read_exact(Packet::HEADER_SIZE).await?;
            let header = reader.header(&head)?;

            let body = self.transport.read_exact(header.payload_len()).await?;
            let checksum = self.transport.read_exact(Packet::CHECKSUM_SIZE).await?;

            if reader.push(&header, &body, &checksum)? {
                break;
            }
        }

        trace!("Bulk transfer complete after {} packets", reader.packets());
        Ok(reader.finish())
    }

    async fn send_bulk(&mut self, data: &[u8]) -> Result<()> {
        let result = self.write_stream(data).await;
        self.track(result)
    }

    async fn write_stream(&mut self, data: &[u8]) -> Result<()> {
        let packet_size = self.params.map(|p| p.packet_size).unwrap_or_default();
        let packets = bulk::split(self.session.address(), data, packet_size.bytes())?;

        trace!(
            "Sending {} bytes as {} packets of up to {} bytes",
            data.len(),
            packets.len(),
            packet_size.bytes()
        );

        for packet in &packets {
            self.send_packet(packet).await?;
        }
        Ok(())
    }
}

/// Big-endian u16 at `offset` after the status byte
fn read_word(reply: &Packet, offset: usize) -> Result<u16> {
    let body = reply.body();
    body.get(offset..offset + 2)
        .map(BigEndian::read_u16)
        .ok_or_else(|| {
            Error::InvalidResponse(format!(
                "reply body of {} bytes has no word at offset {}",
                body.len(),
                offset
            ))
        })
}
