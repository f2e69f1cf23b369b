use std::io::{Cursor, Read, Write};

use crate::backing::BackingStore;
use crate::Result;

type Memory = Cursor<Vec<u8>>;

/// メモリベースの`BackingStore`の実装.
///
/// 主にテスト用途や、CPU側でバッファの内容を組み立ててから
/// まとめて転送するような用途を意図している.
#[derive(Debug, Clone)]
pub struct MemoryBacking {
    memory: Memory,
}
impl MemoryBacking {
    /// `capacity`バイトのゼロ埋めされた領域を持つ`MemoryBacking`インスタンスを生成する.
    pub fn new(capacity: usize) -> Self {
        Self::from_vec(vec![0; capacity])
    }

    /// 既存のバイト列を領域として利用する`MemoryBacking`インスタンスを生成する.
    pub fn from_vec(memory: Vec<u8>) -> Self {
        MemoryBacking {
            memory: Cursor::new(memory),
        }
    }

    /// 領域全体を返す.
    pub fn as_bytes(&self) -> &[u8] {
        self.memory.get_ref()
    }

    /// 領域全体を`Vec<u8>`として取り出す.
    pub fn into_vec(self) -> Vec<u8> {
        self.memory.into_inner()
    }
}
impl BackingStore for MemoryBacking {
    fn write(&mut self, offset: u64, bytes: &[u8]) -> Result<()> {
        track!(self.check_range(offset, bytes.len()))?;
        self.memory.set_position(offset);

        // 容量内であることは検査済みなので、`Vec`が伸長されることはない
        track_io!(self.memory.write_all(bytes))
    }
    fn read(&mut self, offset: u64, buf: &mut [u8]) -> Result<()> {
        track!(self.check_range(offset, buf.len()))?;
        self.memory.set_position(offset);
        track_io!(self.memory.read_exact(buf))
    }
    fn capacity(&self) -> u64 {
        self.memory.get_ref().len() as u64
    }
}

#[cfg(test)]
mod tests {
    use trackable::result::TestResult;

    use super::*;
    use crate::backing::BackingStore;
    use crate::ErrorKind;

    #[test]
    fn it_works() -> TestResult {
        let mut backing = MemoryBacking::new(16);
        assert_eq!(backing.capacity(), 16);

        track!(backing.write(4, b"foo"))?;
        track!(backing.write(14, b"ba"))?;

        let mut buf = [0; 3];
        track!(backing.read(4, &mut buf))?;
        assert_eq!(&buf, b"foo");

        assert_eq!(
            backing.as_bytes(),
            &[0, 0, 0, 0, b'f', b'o', b'o', 0, 0, 0, 0, 0, 0, 0, b'b', b'a'][..]
        );
        track!(backing.flush())?;
        Ok(())
    }

    #[test]
    fn out_of_range() {
        let mut backing = MemoryBacking::new(16);
        assert_eq!(
            backing.write(14, b"foo").err().map(|e| *e.kind()),
            Some(ErrorKind::InvalidInput)
        );
        assert_eq!(
            backing.write(u64::max_value(), b"a").err().map(|e| *e.kind()),
            Some(ErrorKind::InvalidInput)
        );

        let mut buf = [0; 2];
        assert_eq!(
            backing.read(15, &mut buf).err().map(|e| *e.kind()),
            Some(ErrorKind::InvalidInput)
        );

        // 失敗した書き込みによって領域が伸長されることはない
        assert_eq!(backing.as_bytes(), &[0; 16][..]);
        assert_eq!(backing.into_vec().len(), 16);
    }
}
