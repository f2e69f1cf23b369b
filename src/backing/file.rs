use std::fs::{self, File};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use crate::backing::BackingStore;
use crate::Result;

/// ファイルベースの`BackingStore`の実装.
///
/// ファイルのサイズは生成時に確定し、以後変更されることはない.
#[derive(Debug)]
pub struct FileBacking {
    file: File,
    capacity: u64,
}
impl FileBacking {
    /// ファイルを新規に作成して`FileBacking`インスタンスを生成する.
    ///
    /// ファイルが既に存在する場合には、内容を破棄した上で`capacity`バイトに切り詰められる.
    pub fn create<P: AsRef<Path>>(filepath: P, capacity: u64) -> Result<Self> {
        if let Some(dir) = filepath.as_ref().parent() {
            track_io!(fs::create_dir_all(dir))?;
        }
        let file = track_io!(fs::OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(filepath))?;
        track_io!(file.set_len(capacity))?;
        Ok(FileBacking { file, capacity })
    }

    /// 既存のファイルを開いて`FileBacking`インスタンスを生成する.
    ///
    /// 容量はファイルのサイズとなる.
    pub fn open<P: AsRef<Path>>(filepath: P) -> Result<Self> {
        let file = track_io!(fs::OpenOptions::new()
            .read(true)
            .write(true)
            .create(false)
            .open(filepath))?;
        let capacity = track_io!(file.metadata())?.len();
        Ok(FileBacking { file, capacity })
    }
}
impl BackingStore for FileBacking {
    fn write(&mut self, offset: u64, bytes: &[u8]) -> Result<()> {
        track!(self.check_range(offset, bytes.len()))?;
        track_io!(self.file.seek(SeekFrom::Start(offset)))?;
        track_io!(self.file.write_all(bytes))
    }
    fn read(&mut self, offset: u64, buf: &mut [u8]) -> Result<()> {
        track!(self.check_range(offset, buf.len()))?;
        track_io!(self.file.seek(SeekFrom::Start(offset)))?;
        track_io!(self.file.read_exact(buf))
    }
    fn capacity(&self) -> u64 {
        self.capacity
    }
    fn flush(&mut self) -> Result<()> {
        track_io!(self.file.flush())?;
        track_io!(self.file.sync_data())?;
        Ok(())
    }
}
