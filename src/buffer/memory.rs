use super::{Address, BufferHandle, Ctl, HandleError, Region, Selection};
use std::io::{self, SeekFrom};

/// Operation performed against a [`MemoryBuffer`], in call order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    ReadAddr,
    SetAddr(Address),
    Ctl(Vec<Ctl>),
    SeekBody(u64),
    WriteData(usize),
}

/// Injected failure points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    ReadAddr,
    SetAddr,
    /// Any control message.
    Ctl,
    /// Control messages containing `show`.
    Show,
    /// Control messages that send `mark` without `nomark`.
    Mark,
    ReadBody,
    SeekBody,
    /// Data writes after this many bytes have been accepted.
    WriteData { after: usize },
}

/// In-process buffer host with acme's addressing rules.
///
/// Offsets are bytes. Opening the address (the first `read_addr`) zeroes it.
/// Writes to `data` replace the addressed range and leave the address
/// collapsed just past the inserted bytes.
///
/// Undo units are numbered. `mark` starts a new one. A data write also starts
/// a new one unless `nomark` is in effect, in which case it joins the current
/// unit. Every call is recorded.
#[derive(Debug, Clone, Default)]
pub struct MemoryBuffer {
    body: Vec<u8>,
    body_pos: usize,
    addr: Selection,
    addr_open: bool,
    dot: Selection,
    nomark: bool,
    seq: u64,
    write_seqs: Vec<u64>,
    shown: bool,
    data_written: usize,
    ops: Vec<Op>,
    faults: Vec<Fault>,
}

impl MemoryBuffer {
    pub fn new(content: impl Into<Vec<u8>>) -> Self {
        Self {
            body: content.into(),
            // The user's most recent edit.
            seq: 1,
            ..Self::default()
        }
    }

    pub fn with_dot(mut self, dot: Selection) -> Self {
        self.dot = dot;
        self
    }

    pub fn fail_on(mut self, fault: Fault) -> Self {
        self.faults.push(fault);
        self
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn dot(&self) -> Selection {
        self.dot
    }

    /// Whether writes currently start new undo units.
    pub fn marking(&self) -> bool {
        !self.nomark
    }

    /// Current undo unit.
    pub fn undo_seq(&self) -> u64 {
        self.seq
    }

    /// Undo unit each data write was recorded under, in order.
    pub fn write_seqs(&self) -> &[u64] {
        &self.write_seqs
    }

    /// Whether `show` has been requested.
    pub fn shown(&self) -> bool {
        self.shown
    }

    pub fn ops(&self) -> &[Op] {
        &self.ops
    }

    /// Number of writes to the data region.
    pub fn data_writes(&self) -> usize {
        self.ops
            .iter()
            .filter(|op| matches!(op, Op::WriteData(_)))
            .count()
    }

    /// Control directives issued so far, flattened.
    pub fn ctl_log(&self) -> Vec<Ctl> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                Op::Ctl(cmds) => Some(cmds.clone()),
                _ => None,
            })
            .flatten()
            .collect()
    }

    fn has_fault(&self, fault: Fault) -> bool {
        self.faults.contains(&fault)
    }

    fn injected(what: &str) -> io::Error {
        io::Error::other(format!("injected {what} failure"))
    }

    fn clamp(&self, sel: Selection) -> Selection {
        let len = self.body.len();
        Selection::new(sel.start.min(len), sel.end.min(len))
    }
}

impl BufferHandle for MemoryBuffer {
    fn read_addr(&mut self) -> Result<Selection, HandleError> {
        self.ops.push(Op::ReadAddr);
        if self.has_fault(Fault::ReadAddr) {
            return Err(HandleError::Io {
                file: "addr",
                source: Self::injected("addr read"),
            });
        }
        if !self.addr_open {
            self.addr_open = true;
            self.addr = Selection::default();
        }
        Ok(self.addr)
    }

    fn set_addr(&mut self, addr: Address) -> Result<(), HandleError> {
        self.ops.push(Op::SetAddr(addr));
        if self.has_fault(Fault::SetAddr) {
            return Err(HandleError::Io {
                file: "addr",
                source: Self::injected("addr write"),
            });
        }
        self.addr_open = true;
        self.addr = match addr {
            Address::All => Selection::new(0, self.body.len()),
            Address::Range(sel) => {
                if sel.end > self.body.len() {
                    return Err(HandleError::MalformedAddr(sel.to_string()));
                }
                sel
            }
        };
        Ok(())
    }

    fn ctl(&mut self, cmds: &[Ctl]) -> Result<(), HandleError> {
        self.ops.push(Op::Ctl(cmds.to_vec()));
        let fails = self.has_fault(Fault::Ctl)
            || (self.has_fault(Fault::Show) && cmds.contains(&Ctl::Show))
            || (self.has_fault(Fault::Mark)
                && cmds.contains(&Ctl::Mark)
                && !cmds.contains(&Ctl::NoMark));
        if fails {
            return Err(HandleError::Io {
                file: "ctl",
                source: Self::injected("ctl"),
            });
        }
        for cmd in cmds {
            match cmd {
                Ctl::AddrFromDot => self.addr = self.dot,
                Ctl::DotFromAddr => self.dot = self.addr,
                Ctl::Show => self.shown = true,
                Ctl::NoMark => self.nomark = true,
                Ctl::Mark => {
                    self.seq += 1;
                    self.nomark = false;
                }
            }
        }
        Ok(())
    }

    fn read(&mut self, region: Region, buf: &mut [u8]) -> io::Result<usize> {
        match region {
            Region::Body => {
                if self.has_fault(Fault::ReadBody) {
                    return Err(Self::injected("body read"));
                }
                let rest = self.body.get(self.body_pos..).unwrap_or_default();
                let n = rest.len().min(buf.len());
                buf[..n].copy_from_slice(&rest[..n]);
                self.body_pos += n;
                Ok(n)
            }
            Region::Data => {
                let addr = self.clamp(self.addr);
                let n = addr.len().min(buf.len());
                buf[..n].copy_from_slice(&self.body[addr.start..addr.start + n]);
                self.addr = Selection::new(addr.start + n, addr.end);
                Ok(n)
            }
        }
    }

    fn write(&mut self, region: Region, buf: &[u8]) -> io::Result<usize> {
        match region {
            Region::Body => {
                self.body.extend_from_slice(buf);
                Ok(buf.len())
            }
            Region::Data => {
                self.ops.push(Op::WriteData(buf.len()));
                if let Some(Fault::WriteData { after }) = self
                    .faults
                    .iter()
                    .find(|f| matches!(f, Fault::WriteData { .. }))
                {
                    if self.data_written + buf.len() > *after {
                        return Err(Self::injected("data write"));
                    }
                }
                if !self.nomark {
                    self.seq += 1;
                }
                self.write_seqs.push(self.seq);
                let addr = self.clamp(self.addr);
                self.body
                    .splice(addr.start..addr.end, buf.iter().copied());
                let end = addr.start + buf.len();
                self.addr = Selection::new(end, end);
                self.data_written += buf.len();
                Ok(buf.len())
            }
        }
    }

    fn seek(&mut self, region: Region, pos: SeekFrom) -> io::Result<u64> {
        if region != Region::Body {
            return Err(io::Error::new(
                io::ErrorKind::Unsupported,
                format!("cannot seek {}", region.name()),
            ));
        }
        if self.has_fault(Fault::SeekBody) {
            return Err(Self::injected("body seek"));
        }
        let len = self.body.len() as i64;
        let target = match pos {
            SeekFrom::Start(n) => n as i64,
            SeekFrom::End(d) => len + d,
            SeekFrom::Current(d) => self.body_pos as i64 + d,
        };
        if target < 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "seek before start of body",
            ));
        }
        self.body_pos = target as usize;
        self.ops.push(Op::SeekBody(target as u64));
        Ok(target as u64)
    }
}
