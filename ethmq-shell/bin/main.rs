//! An MQTT client on a tap interface, typed at from the terminal.
//!
//! # Usage
//!
//! The shell opens a tap as its network device and reads commands from stdin, one per line:
//! `pub <topic> <message>`, `sub <topic>`, `unsub <topic>`, `setip <a.b.c.d>`, `ifconfig` and
//! `reboot`. Messages of subscribed topics are printed as they arrive. Any UDP datagram is
//! answered with `Received`.
//!
//! 1. Setup the tap interface, named `tap0` here:
//!
//!   > $ ip tuntap add mode tap name tap0
//! 2. Assign an address on the host system and bring it up
//!
//!   > $ ip addr add 10.0.0.2/24 dev tap0
//!   > $ ip link set up dev tap0
//! 3. Run a broker listening on the host address, then start the shell
//!
//!   > $ RUST_LOG=debug cargo run --bin ethmq-shell -- tap0 10.0.0.1 02:03:04:05:06:8a 10.0.0.2
use std::io::{self, stdout, Read, Write};
use std::os::unix::io::AsRawFd;
use std::sync::mpsc;
use std::thread;

use ethmq::engine::{Engine, Outcome};
use ethmq::nic::{sys, MAX_FRAME_LEN};
use ethmq::storage::MemoryStore;
use ethmq::time::Instant;
use ethmq_shell::{config::Config, Console, Terminal};

fn main() {
    env_logger::init();
    let config = Config::from_args();

    let engine_config = config.engine().unwrap_or_else(|err| {
        eprintln!("Invalid configuration: {}", err);
        std::process::exit(2);
    });

    let mut console = Console::new(MemoryStore::<64>::new());
    let mut engine = Engine::new(engine_config.with_stored_ip(console.store()));

    let mut interface = sys::TapInterface::new(&config.tap)
        .expect("Couldn't initialize interface");
    let mut buffer = vec![0; MAX_FRAME_LEN];
    let mut terminal = Terminal::new(stdout());

    let input = spawn_input();
    let mut out = String::new();

    println!("Started ethmq on {} as {}", config.tap, engine.ip_addr());
    log::info!("broker {}:{}", config.broker, config.port);

    loop {
        for byte in input.try_iter() {
            let outcome = console.input(byte, &mut engine, &mut interface, &mut out);
            if outcome == Some(Outcome::Reboot) {
                out.push_str("\r\nRebooting...\r\n");
                engine.reset();
            }
        }
        if !out.is_empty() {
            let mut stdout = stdout();
            let _ = stdout.write_all(out.as_bytes());
            let _ = stdout.flush();
            out.clear();
        }

        let poll = engine.poll(&mut interface, &mut buffer, Instant::now(), &mut terminal);
        if poll.overflow || poll.transmit_failed {
            log::warn!("interface error: {:?}", interface.last_err());
        }

        if poll.received == 0 && poll.outbound.is_none() {
            match sys::sys_wait(interface.as_raw_fd(), Some(config.interval())) {
                Ok(_) => (),
                Err(err) => panic!("Error waiting for the interface: {}", err),
            }
        }
    }
}

/// Forward stdin byte by byte, the terminal delivers whole lines.
fn spawn_input() -> mpsc::Receiver<u8> {
    let (send, recv) = mpsc::channel();
    thread::spawn(move || {
        let stdin = io::stdin();
        for byte in stdin.lock().bytes() {
            match byte {
                Ok(byte) => if send.send(byte).is_err() { return },
                Err(err) => {
                    log::error!("stdin: {}", err);
                    return;
                },
            }
        }
    });
    recv
}
