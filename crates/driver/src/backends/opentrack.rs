//! opentrack "UDP over network" receiver.
//!
//! Each datagram is six little-endian `f64`: x, y, z (cm), then yaw, pitch,
//! roll (degrees). Only the rotation is used.

use std::net::{SocketAddr, UdpSocket};
use std::time::{Duration, Instant};

use headmouse_common::error::{HeadmouseError, HeadmouseResult};
use headmouse_transducer::OrientationSample;

use crate::OrientationSource;

const DATAGRAM_LEN: usize = 6 * 8;

/// A pose older than this is no longer reported.
pub const DEFAULT_STALE_AFTER: Duration = Duration::from_millis(250);

/// Raw rotation in degrees, before the neutral offset is applied.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
struct Rotation {
    yaw: f64,
    pitch: f64,
    roll: f64,
}

pub struct OpenTrackSource {
    socket: UdpSocket,
    local_addr: SocketAddr,
    latest: Option<(Rotation, Instant)>,
    neutral: Rotation,
    stale_after: Duration,
    stale_reported: bool,
    datagrams: u64,
}

impl OpenTrackSource {
    /// Bind a non-blocking receiver on `addr` (e.g. "127.0.0.1:4242").
    pub fn bind(addr: &str) -> HeadmouseResult<Self> {
        let socket = UdpSocket::bind(addr)
            .map_err(|e| HeadmouseError::source(format!("Failed to bind {addr}: {e}")))?;
        socket.set_nonblocking(true)?;
        let local_addr = socket.local_addr()?;
        tracing::info!(%local_addr, "Listening for opentrack UDP");

        Ok(Self {
            socket,
            local_addr,
            latest: None,
            neutral: Rotation::default(),
            stale_after: DEFAULT_STALE_AFTER,
            stale_reported: false,
            datagrams: 0,
        })
    }

    pub fn with_stale_after(mut self, stale_after: Duration) -> Self {
        self.stale_after = stale_after;
        self
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn datagrams_received(&self) -> u64 {
        self.datagrams
    }

    /// Read every queued datagram, keeping the newest pose.
    fn drain(&mut self) -> HeadmouseResult<()> {
        let mut buf = [0u8; 64];
        loop {
            match self.socket.recv(&mut buf) {
                Ok(len) => match decode_datagram(&buf[..len]) {
                    Some(rotation) => {
                        self.latest = Some((rotation, Instant::now()));
                        self.datagrams += 1;
                    }
                    None => tracing::debug!(len, "Ignoring datagram of unexpected size"),
                },
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => break,
                Err(e) => {
                    return Err(HeadmouseError::source(format!(
                        "Failed reading opentrack socket: {e}"
                    )));
                }
            }
        }
        Ok(())
    }
}

impl OrientationSource for OpenTrackSource {
    fn poll(&mut self) -> HeadmouseResult<Option<OrientationSample>> {
        self.drain()?;

        let Some((rotation, received_at)) = self.latest else {
            return Ok(None);
        };

        if received_at.elapsed() > self.stale_after {
            if !self.stale_reported {
                tracing::warn!(
                    age_ms = received_at.elapsed().as_millis() as u64,
                    "opentrack pose is stale; holding pointer"
                );
                self.stale_reported = true;
            }
            return Ok(None);
        }
        if self.stale_reported {
            tracing::info!("opentrack pose resumed");
            self.stale_reported = false;
        }

        Ok(Some(relative_to(rotation, self.neutral)))
    }

    fn recenter(&mut self) -> HeadmouseResult<()> {
        self.drain()?;
        if let Some((rotation, _)) = self.latest {
            self.neutral = rotation;
            tracing::debug!(
                yaw = rotation.yaw,
                pitch = rotation.pitch,
                "opentrack neutral pose updated"
            );
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "opentrack"
    }
}

fn decode_datagram(bytes: &[u8]) -> Option<Rotation> {
    if bytes.len() != DATAGRAM_LEN {
        return None;
    }
    let mut values = [0.0f64; 6];
    for (value, chunk) in values.iter_mut().zip(bytes.chunks_exact(8)) {
        let mut raw = [0u8; 8];
        raw.copy_from_slice(chunk);
        *value = f64::from_le_bytes(raw);
    }
    Some(Rotation {
        yaw: values[3],
        pitch: values[4],
        roll: values[5],
    })
}

fn relative_to(rotation: Rotation, neutral: Rotation) -> OrientationSample {
    OrientationSample::new(
        wrap_degrees(rotation.yaw - neutral.yaw),
        wrap_degrees(rotation.pitch - neutral.pitch),
        wrap_degrees(rotation.roll - neutral.roll),
    )
}

/// Wrap into (-180, 180]. NaN stays NaN.
pub fn wrap_degrees(angle: f64) -> f64 {
    if !angle.is_finite() {
        return angle;
    }
    let wrapped = (angle + 180.0).rem_euclid(360.0) - 180.0;
    if wrapped <= -180.0 {
        180.0
    } else {
        wrapped
    }
}
