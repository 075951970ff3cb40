//! Drive an ethmq engine from a terminal.
//!
//! The [`Console`] turns typed bytes into commands for the engine, the [`Terminal`] shows what
//! the broker sends and answers UDP datagrams.
use std::fmt::Write as _;
use std::io;

use ethmq::console::{Command, Completion, LineEditor, TRUNCATION_WARNING};
use ethmq::engine::{Engine, Handler, Outcome};
use ethmq::layer::udp;
use ethmq::nic::Transport;
use ethmq::storage::KeyStore;

pub mod config;

/// The reply to every UDP datagram.
pub const DATAGRAM_REPLY: &[u8] = b"Received";

/// The line console, with the key store `setip` writes to.
pub struct Console<S> {
    editor: LineEditor,
    store: S,
}

impl<S: KeyStore> Console<S> {
    pub fn new(store: S) -> Self {
        Console {
            editor: LineEditor::new(),
            store,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Edit the line with one typed byte and execute it once finished.
    ///
    /// Responses and errors are written to `out`. Returns the outcome of an executed command.
    pub fn input<T>(&mut self, byte: u8, engine: &mut Engine, nic: &mut T, out: &mut String)
        -> Option<Outcome>
        where T: Transport + ?Sized
    {
        let completion = self.editor.push(byte)?;
        if completion == Completion::Truncated {
            let _ = write!(out, "{}\r\n", TRUNCATION_WARNING);
        }

        let line = self.editor.line();
        let command = match Command::parse(line) {
            Some(command) => command,
            None => {
                log::debug!("console: ignoring {:?}", line);
                return None;
            },
        };

        match engine.execute(&command, &mut self.store, nic, out) {
            Ok(outcome) => Some(outcome),
            Err(err) => {
                let _ = write!(out, "{}\r\n", err);
                None
            },
        }
    }
}

/// Prints messages of the broker and answers datagrams.
pub struct Terminal<W> {
    out: W,
}

impl<W: io::Write> Terminal<W> {
    pub fn new(out: W) -> Self {
        Terminal { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: io::Write> Handler for Terminal<W> {
    fn message(&mut self, topic: &str, message: &[u8]) {
        let _ = write!(self.out, "{}: {}\r\n", topic, String::from_utf8_lossy(message));
        let _ = self.out.flush();
    }

    fn datagram(&mut self, datagram: &udp::Datagram, payload: &mut [u8]) -> Option<usize> {
        let received = payload.get(..datagram.payload_len)?;
        log::info!("udp from port {}: {:?}",
            datagram.src_port, String::from_utf8_lossy(received));

        payload.get_mut(..DATAGRAM_REPLY.len())?.copy_from_slice(DATAGRAM_REPLY);
        Some(DATAGRAM_REPLY.len())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use ethmq::engine::{Config, Request};
    use ethmq::nic::loopback::Loopback;
    use ethmq::storage::{load_ip, MemoryStore, IP_ADDRESS};
    use ethmq::wire::Ipv4Address;

    struct Bench {
        console: Console<MemoryStore>,
        engine: Engine,
        nic: Loopback,
        out: String,
    }

    impl Bench {
        fn new() -> Self {
            Bench {
                console: Console::new(MemoryStore::new()),
                engine: Engine::new(Config::default()),
                nic: Loopback::new(),
                out: String::new(),
            }
        }

        fn type_in(&mut self, text: &[u8]) -> Vec<Outcome> {
            let Bench { console, engine, nic, out } = self;
            text.iter()
                .filter_map(|&byte| console.input(byte, engine, nic, out))
                .collect()
        }
    }

    #[test]
    fn publish() {
        let mut bench = Bench::new();
        assert_eq!(bench.type_in(b"pub lights/kitchen on\r"), vec![Outcome::Done]);
        assert_eq!(bench.engine.pending(), Some(&Request::publish("lights/kitchen", "on").unwrap()));

        assert!(bench.type_in(b"sub lights\r").is_empty());
        assert_eq!(bench.out, "a request is already pending\r\n");
    }

    #[test]
    fn unknown_ignored() {
        let mut bench = Bench::new();
        assert!(bench.type_in(b"launch rockets\rsub\r").is_empty());
        assert!(bench.out.is_empty());
        assert_eq!(bench.engine.pending(), None);
    }

    #[test]
    fn truncated_line() {
        let mut bench = Bench::new();
        let mut line = b"sub ".to_vec();
        line.resize(100, b'x');
        assert_eq!(bench.type_in(&line), vec![Outcome::Done]);
        assert!(bench.out.starts_with(TRUNCATION_WARNING));
        match bench.engine.pending() {
            Some(Request::Subscribe { topic }) => assert_eq!(topic.len(), 76),
            other => panic!("unexpected request {:?}", other),
        }
    }

    #[test]
    fn setip_and_reboot() {
        let mut bench = Bench::new();
        assert_eq!(bench.type_in(b"setip 10.0.0.7\rifconfig\rreboot\r"),
                   vec![Outcome::Done, Outcome::Done, Outcome::Reboot]);
        assert_eq!(load_ip(bench.console.store(), IP_ADDRESS), Some(Ipv4Address::new(10, 0, 0, 7)));
        assert!(bench.out.contains("IP: 10.0.0.7 (static)\r\n"));
    }

    #[test]
    fn terminal_prints_messages() {
        let mut terminal = Terminal::new(Vec::new());
        terminal.message("lights/kitchen", b"on");
        assert_eq!(terminal.into_inner(), b"lights/kitchen: on\r\n");
    }

    #[test]
    fn terminal_answers_datagrams() {
        let mut terminal = Terminal::new(io::sink());
        let datagram = udp::Datagram { dst_port: 1024, src_port: 40000, payload_len: 2 };
        let mut payload = *b"on\0\0\0\0\0\0\0\0";
        assert_eq!(terminal.datagram(&datagram, &mut payload), Some(8));
        assert_eq!(&payload[..8], DATAGRAM_REPLY);

        // No room for the reply.
        let mut payload = *b"on";
        assert_eq!(terminal.datagram(&datagram, &mut payload), None);
    }
}
