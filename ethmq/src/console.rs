//! The serial console: line editing, tokenizing and the command set.
//!
//! Bytes arrive one at a time from a UART or a terminal. The [`LineEditor`] assembles them into a
//! line, [`Fields`] splits the line and [`Command`] gives it meaning. Executing a command needs
//! the engine, see [`Engine::execute`].
//!
//! [`LineEditor`]: struct.LineEditor.html
//! [`Fields`]: struct.Fields.html
//! [`Command`]: enum.Command.html
//! [`Engine::execute`]: ../engine/struct.Engine.html#method.execute
use core::fmt;

use heapless::String;

use crate::engine::Config;
use crate::wire::Ipv4Address;

/// The longest line the editor accepts.
pub const MAX_CHARS: usize = 80;

/// Printed when a line reached `MAX_CHARS` before it was finished.
pub const TRUNCATION_WARNING: &str = "You have exceeded the maximum characters, you typed";

const BACKSPACE: u8 = 8;
const DELETE: u8 = 127;
const LINE_FEED: u8 = 10;
const CARRIAGE_RETURN: u8 = 13;

/// How a line was finished.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Completion {
    /// By carriage return or line feed.
    Line,
    /// By reaching `MAX_CHARS`, the rest of the input belongs to the next line.
    Truncated,
}

/// Assembles input bytes into a line.
///
/// Input is UTF-8, `MAX_CHARS` counts its octets.
#[derive(Clone, Debug, Default)]
pub struct LineEditor {
    line: String<MAX_CHARS>,
    finished: bool,
    partial: Partial,
    /// A character that did not fit into the truncated line, it starts the next one.
    carry: Option<char>,
}

/// The octets of a multi-octet character received so far.
#[derive(Clone, Copy, Debug, Default)]
struct Partial {
    bytes: [u8; 4],
    len: usize,
    width: usize,
}

impl Partial {
    fn start(lead: u8) -> Self {
        let width = match lead {
            0xc2..=0xdf => 2,
            0xe0..=0xef => 3,
            _ => 4,
        };
        Partial { bytes: [lead, 0, 0, 0], len: 1, width }
    }

    /// Add a continuation octet, returning the character once it is complete.
    fn push(&mut self, byte: u8) -> Option<char> {
        if self.len == 0 {
            return None;
        }
        self.bytes[self.len] = byte;
        self.len += 1;
        if self.len < self.width {
            return None;
        }

        let ch = core::str::from_utf8(&self.bytes[..self.width])
            .ok()
            .and_then(|text| text.chars().next());
        *self = Partial::default();
        ch
    }
}

impl LineEditor {
    /// An editor with an empty line.
    pub fn new() -> Self {
        LineEditor::default()
    }

    /// Edit the line with one input byte.
    ///
    /// Backspace and delete remove the last character, carriage return or line feed finish the
    /// line. Other control bytes and malformed UTF-8 are ignored. After a line was finished the
    /// next byte starts a new one.
    pub fn push(&mut self, byte: u8) -> Option<Completion> {
        if self.finished {
            self.line.clear();
            self.finished = false;
            if let Some(ch) = self.carry.take() {
                let _ = self.line.push(ch);
            }
        }

        match byte {
            BACKSPACE | DELETE => {
                self.partial = Partial::default();
                self.line.pop();
                None
            },
            LINE_FEED | CARRIAGE_RETURN => {
                self.partial = Partial::default();
                self.finished = true;
                Some(Completion::Line)
            },
            0x20..=0x7e => {
                self.partial = Partial::default();
                self.append(char::from(byte))
            },
            0xc2..=0xf4 => {
                self.partial = Partial::start(byte);
                None
            },
            0x80..=0xbf => {
                let ch = self.partial.push(byte)?;
                self.append(ch)
            },
            _ => {
                self.partial = Partial::default();
                None
            },
        }
    }

    fn append(&mut self, ch: char) -> Option<Completion> {
        if self.line.push(ch).is_err() {
            self.carry = Some(ch);
            self.finished = true;
            return Some(Completion::Truncated);
        }

        if self.line.len() == MAX_CHARS {
            self.finished = true;
            Some(Completion::Truncated)
        } else {
            None
        }
    }

    /// Feed bytes until a line is finished or the input runs dry.
    pub fn read_line<I>(&mut self, input: &mut I) -> Option<Completion>
        where I: Iterator<Item=u8>
    {
        loop {
            let byte = input.next()?;
            if let Some(completion) = self.push(byte) {
                return Some(completion);
            }
        }
    }

    /// The line as edited so far, or the finished line.
    pub fn line(&self) -> &str {
        &self.line
    }

    /// Whether the line was finished.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Discard the line.
    pub fn clear(&mut self) {
        self.line.clear();
        self.finished = false;
        self.partial = Partial::default();
        self.carry = None;
    }
}

/// A console line split into a command and up to two arguments.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Fields<'a> {
    /// The first word.
    pub command: &'a str,
    /// The second word.
    pub arg1: Option<&'a str>,
    /// Everything after the second word, so that it may contain separators.
    pub arg2: Option<&'a str>,
}

fn is_separator(ch: char) -> bool {
    ch == ' ' || ch == ','
}

/// Split off the first word, returning it and the rest without leading separators.
fn word(text: &str) -> (&str, &str) {
    let text = text.trim_start_matches(is_separator);
    match text.find(is_separator) {
        Some(end) => (&text[..end], text[end..].trim_start_matches(is_separator)),
        None => (text, ""),
    }
}

impl<'a> Fields<'a> {
    /// Split a line on spaces and commas.
    pub fn tokenize(line: &'a str) -> Self {
        let (command, rest) = word(line);
        let (arg1, rest) = word(rest);
        let arg2 = rest.trim_end_matches(is_separator);

        Fields {
            command,
            arg1: Some(arg1).filter(|arg| !arg.is_empty()),
            arg2: Some(arg2).filter(|arg| !arg.is_empty()),
        }
    }
}

/// A console command.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Command<'a> {
    /// `pub <topic> <message>`: publish a message.
    Publish {
        /// The topic.
        topic: &'a str,
        /// The message, possibly empty.
        message: &'a str,
    },
    /// `sub <topic>`: subscribe to a topic.
    Subscribe {
        /// The topic filter.
        topic: &'a str,
    },
    /// `unsub <topic>`: unsubscribe from a topic.
    Unsubscribe {
        /// The topic filter.
        topic: &'a str,
    },
    /// `setip <a.b.c.d>`: change and persist our address.
    SetIp(Ipv4Address),
    /// `ifconfig`: print the configuration.
    Ifconfig,
    /// `reboot`: start over.
    Reboot,
}

impl<'a> Command<'a> {
    /// Parse a console line.
    ///
    /// Returns `None` for unknown commands and for commands missing a required argument.
    pub fn parse(line: &'a str) -> Option<Self> {
        let fields = Fields::tokenize(line);
        let command = match fields.command {
            "pub" | "publish" => Command::Publish {
                topic: fields.arg1?,
                message: fields.arg2.unwrap_or(""),
            },
            "sub" => Command::Subscribe { topic: fields.arg1? },
            "unsub" => Command::Unsubscribe { topic: fields.arg1? },
            "setip" => Command::SetIp(fields.arg1?.parse().ok()?),
            "ifconfig" => Command::Ifconfig,
            "reboot" => Command::Reboot,
            _ => return None,
        };
        Some(command)
    }
}

/// Print the interface configuration.
///
/// ```text
/// HW: 02:03:04:05:06:8a
/// IP: 192.168.10.138 (static)
/// SN: 255.255.255.0
/// GW: 192.168.1.1
/// Link is up
/// ```
pub fn ifconfig<W: fmt::Write + ?Sized>(out: &mut W, config: &Config, link_up: bool)
    -> fmt::Result
{
    write!(out, "HW: {}\r\n", config.hardware_addr)?;
    let mode = if config.dhcp { "dhcp" } else { "static" };
    write!(out, "IP: {} ({})\r\n", config.ip_addr, mode)?;
    write!(out, "SN: {}\r\n", config.subnet_mask)?;
    write!(out, "GW: {}\r\n", config.gateway)?;
    if link_up {
        out.write_str("Link is up\r\n")
    } else {
        out.write_str("Link is down\r\n")
    }
}
