//! The TCP connection and MQTT session state machine.
//!
//! The machine is an explicit function of the current [`State`] and one [`Event`]: it yields the
//! next state and at most one [`Action`], the frame to build next. It never builds or sends
//! anything itself, and the [`Session`] bookkeeping around it only records what the last segment
//! of the broker told us.
//!
//! | State | Event | Action | Next |
//! |---|---|---|---|
//! | Closed | request pending | SYN | SynSent |
//! | SynSent | SYN+ACK | ACK | SynAckReceived, settles to Established |
//! | Established | idle | CONNECT | PublishingMqtt |
//! | PublishingMqtt | CONNACK | the request | DisconnectRequested |
//! | DisconnectRequested | ACK, SUBACK or UNSUBACK | DISCONNECT | FinWait1 |
//! | FinWait1 | FIN+ACK | | FinWait2 |
//! | FinWait2 | idle | ACK | TimeWait |
//! | TimeWait | delay elapsed | clear the request | Closed |
//!
//! Every other pair leaves the state as it is, without an action.
//!
//! [`State`]: enum.State.html
//! [`Event`]: enum.Event.html
//! [`Action`]: enum.Action.html
//! [`Session`]: struct.Session.html
use core::fmt;

use super::classify::{Kind, Segment};
use super::tcp::Numbers;
use crate::time::Instant;

/// The connection state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum State {
    /// No connection, waiting for a request.
    Closed,
    /// Our SYN is out.
    SynSent,
    /// The SYN+ACK of the broker arrived.
    SynAckReceived,
    /// Handshake complete, CONNECT goes out next.
    Established,
    /// CONNECT is out, waiting for CONNACK.
    PublishingMqtt,
    /// The request is out, waiting for the broker to take it.
    DisconnectRequested,
    /// DISCONNECT with FIN is out.
    FinWait1,
    /// The broker closed its side too.
    FinWait2,
    /// Final ACK is out, lingering before close.
    TimeWait,
}

/// Something that may advance the session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Event {
    /// The application asked to publish, subscribe or unsubscribe.
    Request,
    /// A segment of the session was received and classified.
    Segment(Kind),
    /// Nothing was received for the session in this iteration.
    Idle,
    /// The time wait delay has passed.
    Elapsed,
}

/// The frame the session wants to send, or bookkeeping it wants done.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum Action {
    SendSyn,
    SendAck,
    SendConnect,
    /// Send the PUBLISH, SUBSCRIBE or UNSUBSCRIBE of the pending request.
    SendRequest,
    SendDisconnect,
    /// Forget the pending request, it has been carried out.
    ClearRequest,
}

/// The outcome of one step of the state machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Transition {
    /// The state after the step.
    pub next: State,
    /// What to do on the way.
    pub action: Option<Action>,
}

impl State {
    /// Leave transient states that need no further event.
    ///
    /// Our ACK of the SYN+ACK completes the handshake, there is nothing to wait for.
    pub fn settle(self) -> State {
        match self {
            State::SynAckReceived => State::Established,
            other => other,
        }
    }

    /// Whether inbound segments may belong to the session.
    pub fn is_open(self) -> bool {
        self != State::Closed
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Compute the next state and action.
pub fn transition(state: State, event: Event) -> Transition {
    use self::Action::*;
    use self::Event::{Elapsed, Idle, Request};
    use self::State::*;

    let (next, action) = match (state, event) {
        (Closed, Request) => (SynSent, Some(SendSyn)),
        (SynSent, Event::Segment(Kind::SynAck)) => (SynAckReceived, Some(SendAck)),
        (Established, Idle) => (PublishingMqtt, Some(SendConnect)),
        (PublishingMqtt, Event::Segment(Kind::ConnAck)) => (DisconnectRequested, Some(SendRequest)),
        (DisconnectRequested, Event::Segment(Kind::Ack))
        | (DisconnectRequested, Event::Segment(Kind::SubAck))
        | (DisconnectRequested, Event::Segment(Kind::UnsubAck)) => (FinWait1, Some(SendDisconnect)),
        (FinWait1, Event::Segment(Kind::FinAck)) => (FinWait2, None),
        (FinWait2, Idle) => (TimeWait, Some(SendAck)),
        (TimeWait, Elapsed) => (Closed, Some(ClearRequest)),
        (state, _) => (state, None),
    };

    Transition { next, action }
}

/// The state of the single connection, with the broker's latest sequence bookkeeping.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Session {
    state: State,
    local_port: u16,
    peer_seq: u32,
    peer_ack: u32,
    consumed: u32,
    /// The sequence number after our last segment.
    send_next: u32,
    /// When `TimeWait` was entered.
    time_wait_since: Option<Instant>,
}

impl Session {
    /// A closed session.
    pub const fn new() -> Self {
        Session {
            state: State::Closed,
            local_port: 0,
            peer_seq: 0,
            peer_ack: 0,
            consumed: 0,
            send_next: 0,
            time_wait_since: None,
        }
    }

    /// The current state.
    pub fn state(&self) -> State {
        self.state
    }

    /// Our port, meaningful while the session is open.
    pub fn local_port(&self) -> u16 {
        self.local_port
    }

    /// When `TimeWait` was entered, if the session is in it.
    pub fn time_wait_since(&self) -> Option<Instant> {
        self.time_wait_since
    }

    /// Start a new connection from `local_port`, forgetting all numbers of the previous one.
    pub fn open(&mut self, local_port: u16) {
        *self = Session {
            local_port,
            ..Session::new()
        };
    }

    /// Back to closed, as after a reset of the board.
    pub fn reset(&mut self) {
        *self = Session::new();
    }

    /// Check whether a segment belongs to the session.
    ///
    /// It must come from `peer_port` to our port while the session is open. Addresses are
    /// checked by the caller.
    pub fn accepts(&self, segment: &Segment, peer_port: u16) -> bool {
        self.state.is_open()
            && segment.src_port == peer_port
            && segment.dst_port == self.local_port
    }

    /// Record the numbers of a segment of the broker.
    pub fn learn(&mut self, segment: &Segment) {
        self.peer_seq = segment.seq;
        self.peer_ack = segment.ack;
        self.consumed = segment.consumed;
    }

    /// Record the numbers of a segment we sent.
    pub fn sent(&mut self, segment: &Segment) {
        self.send_next = segment.seq.wrapping_add(segment.consumed);
    }

    /// The numbers of our next segment.
    ///
    /// We send from where the broker acknowledged and acknowledge everything its last segment
    /// occupied. A segment the broker has not acknowledged yet, such as a PINGREQ sent between
    /// two steps, moves our sequence number past it.
    pub fn numbers(&self) -> Numbers {
        // Compared in sequence space, modulo 2^32.
        let ahead = self.send_next.wrapping_sub(self.peer_ack) as i32 > 0;
        Numbers {
            seq: if ahead { self.send_next } else { self.peer_ack },
            ack: self.peer_seq.wrapping_add(self.consumed),
        }
    }

    /// Run one step of the state machine and adopt its next state.
    pub fn step(&mut self, event: Event, now: Instant) -> Transition {
        let transition = transition(self.state, event);
        if transition.next != self.state {
            net_debug!("session: {} -> {} on {:?}", self.state, transition.next, event);
        }
        self.enter(transition.next, now);
        transition
    }

    /// Leave transient states, see [`State::settle`].
    ///
    /// [`State::settle`]: enum.State.html#method.settle
    pub fn settle(&mut self, now: Instant) {
        let settled = self.state.settle();
        if settled != self.state {
            net_debug!("session: {} -> {}", self.state, settled);
        }
        self.enter(settled, now);
    }

    fn enter(&mut self, state: State, now: Instant) {
        match state {
            State::TimeWait if self.state != State::TimeWait => self.time_wait_since = Some(now),
            State::TimeWait => (),
            _ => self.time_wait_since = None,
        }
        self.state = state;
    }
}

impl Default for Session {
    fn default() -> Self {
        Session::new()
    }
}
