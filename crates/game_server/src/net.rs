//! # Network Seams
//!
//! The coordination core does not speak the wire protocol. The transport
//! collaborator pushes decoded inbound frames into a queue drained by the
//! network input worker, and the network output worker drains outbound
//! frames into a [`FrameSink`] owned by the transport. Frames are opaque
//! byte payloads tagged with the connection they belong to.

use crossbeam::channel::{bounded, Receiver, Sender};
use tracing::trace;

/// A frame received from some client connection, already stripped of any
/// transport framing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundFrame {
    /// Transport-assigned connection identifier.
    pub connection_id: u64,
    /// Opaque frame payload; decoding belongs to the protocol subsystem.
    pub payload: Vec<u8>,
}

/// A frame queued for delivery to some client connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundFrame {
    /// Transport-assigned connection identifier.
    pub connection_id: u64,
    /// Opaque frame payload.
    pub payload: Vec<u8>,
}

/// Bounded frame queues connecting the transport collaborator to the network
/// workers.
#[derive(Debug, Clone)]
pub struct NetQueues {
    inbound_tx: Sender<InboundFrame>,
    inbound_rx: Receiver<InboundFrame>,
    outbound_tx: Sender<OutboundFrame>,
    outbound_rx: Receiver<OutboundFrame>,
}

impl NetQueues {
    /// Creates both queues with the given per-direction capacity.
    pub fn bounded(capacity: usize) -> Self {
        let (inbound_tx, inbound_rx) = bounded(capacity);
        let (outbound_tx, outbound_rx) = bounded(capacity);
        Self {
            inbound_tx,
            inbound_rx,
            outbound_tx,
            outbound_rx,
        }
    }

    /// Sender half handed to the transport for received frames.
    pub fn inbound_sender(&self) -> Sender<InboundFrame> {
        self.inbound_tx.clone()
    }

    /// Sender half used by gameplay code to queue frames for delivery.
    pub fn outbound_sender(&self) -> Sender<OutboundFrame> {
        self.outbound_tx.clone()
    }

    pub(crate) fn inbound_receiver(&self) -> Receiver<InboundFrame> {
        self.inbound_rx.clone()
    }

    pub(crate) fn outbound_receiver(&self) -> Receiver<OutboundFrame> {
        self.outbound_rx.clone()
    }
}

/// Delivery endpoint the network output worker writes into.
///
/// The real implementation lives in the transport subsystem; the core only
/// requires that delivery is synchronous and reports IO failures.
pub trait FrameSink: Send + Sync + 'static {
    /// Delivers one frame to its connection.
    fn deliver(&self, frame: &OutboundFrame) -> std::io::Result<()>;
}

/// Sink that drops every frame, used until a transport is wired up and in
/// tests.
#[derive(Debug, Default)]
pub struct DiscardSink;

impl FrameSink for DiscardSink {
    fn deliver(&self, frame: &OutboundFrame) -> std::io::Result<()> {
        trace!(
            "discarding {} byte frame for connection {}",
            frame.payload.len(),
            frame.connection_id
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queues_carry_frames_in_order() {
        let queues = NetQueues::bounded(8);
        let tx = queues.inbound_sender();

        for n in 0..3u8 {
            tx.send(InboundFrame {
                connection_id: 1,
                payload: vec![n],
            })
            .unwrap();
        }

        let rx = queues.inbound_receiver();
        assert_eq!(rx.recv().unwrap().payload, vec![0]);
        assert_eq!(rx.recv().unwrap().payload, vec![1]);
        assert_eq!(rx.recv().unwrap().payload, vec![2]);
    }

    #[test]
    fn test_discard_sink_accepts_frames() {
        let sink = DiscardSink;
        let frame = OutboundFrame {
            connection_id: 9,
            payload: b"keepalive".to_vec(),
        };
        assert!(sink.deliver(&frame).is_ok());
    }
}
