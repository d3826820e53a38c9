//! acme window access through its file interface.
//!
//! Each window is a directory `<mount>/<id>/` holding `addr`, `body`, `ctl`
//! and `data`. On Plan 9 the tree lives at `/mnt/acme`; with plan9port it can
//! be mounted there with `9pfuse`.

use super::{Address, BufferHandle, Ctl, HandleError, Region, Selection};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

pub const DEFAULT_MOUNT: &str = "/mnt/acme";

/// Parse the window id acme exports to commands as `$winid`.
pub fn parse_winid(raw: &str) -> Result<u32, HandleError> {
    raw.trim()
        .parse()
        .map_err(|_| HandleError::InvalidId(raw.to_string()))
}

/// Parse the text of an `addr` file read: two decimal offsets.
pub fn parse_addr(text: &str) -> Result<Selection, HandleError> {
    let mut fields = text.split_whitespace().map(str::parse::<usize>);
    match (fields.next(), fields.next(), fields.next()) {
        (Some(Ok(q0)), Some(Ok(q1)), None) => Ok(Selection::new(q0, q1)),
        _ => Err(HandleError::MalformedAddr(text.to_string())),
    }
}

#[derive(Debug)]
pub struct AcmeWindow {
    id: u32,
    dir: PathBuf,
    ctl: File,
    // acme zeroes a window's address whenever `addr` is opened while no one
    // holds it, so it stays open for the life of the handle.
    addr: Option<File>,
    body: Option<File>,
    data: Option<File>,
}

impl AcmeWindow {
    /// Open window `id` under `mount`.
    pub fn open(mount: impl AsRef<Path>, id: u32) -> Result<Self, HandleError> {
        let dir = mount.as_ref().join(id.to_string());
        fs::metadata(&dir).map_err(|source| HandleError::Open {
            path: dir.clone(),
            source,
        })?;
        let ctl_path = dir.join("ctl");
        let ctl = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&ctl_path)
            .map_err(|source| HandleError::Open {
                path: ctl_path,
                source,
            })?;
        log::debug!("opened acme window {} at {}", id, dir.display());
        Ok(Self {
            id,
            dir,
            ctl,
            addr: None,
            body: None,
            data: None,
        })
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn addr_file(&mut self) -> io::Result<&mut File> {
        open_slot(&mut self.addr, &self.dir.join("addr"), true)
    }

    fn region_file(&mut self, region: Region) -> io::Result<&mut File> {
        match region {
            Region::Body => open_slot(&mut self.body, &self.dir.join("body"), false),
            Region::Data => open_slot(&mut self.data, &self.dir.join("data"), true),
        }
    }
}

fn open_slot<'a>(slot: &'a mut Option<File>, path: &Path, write: bool) -> io::Result<&'a mut File> {
    let file = match slot.take() {
        Some(file) => file,
        None => OpenOptions::new().read(true).write(write).open(path)?,
    };
    Ok(slot.insert(file))
}

impl BufferHandle for AcmeWindow {
    fn read_addr(&mut self) -> Result<Selection, HandleError> {
        let file = self.addr_file().map_err(HandleError::io("addr"))?;
        file.seek(SeekFrom::Start(0))
            .map_err(HandleError::io("addr"))?;
        let mut text = String::new();
        file.read_to_string(&mut text)
            .map_err(HandleError::io("addr"))?;
        parse_addr(&text)
    }

    fn set_addr(&mut self, addr: Address) -> Result<(), HandleError> {
        let file = self.addr_file().map_err(HandleError::io("addr"))?;
        file.write_all(addr.to_string().as_bytes())
            .map_err(HandleError::io("addr"))
    }

    fn ctl(&mut self, cmds: &[Ctl]) -> Result<(), HandleError> {
        self.ctl
            .write_all(Ctl::message(cmds).as_bytes())
            .map_err(HandleError::io("ctl"))
    }

    fn read(&mut self, region: Region, buf: &mut [u8]) -> io::Result<usize> {
        self.region_file(region)?.read(buf)
    }

    fn write(&mut self, region: Region, buf: &[u8]) -> io::Result<usize> {
        self.region_file(region)?.write(buf)
    }

    fn seek(&mut self, region: Region, pos: SeekFrom) -> io::Result<u64> {
        self.region_file(region)?.seek(pos)
    }
}
