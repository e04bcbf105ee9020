use zis_introspect::{ByteOrder, MemoryAccessError, Target, Width};

use crate::type_table::TypeTable;

/// Live process read with `process_vm_readv(2)`
///
/// Every read goes to the process. Nothing is cached because the process may continue running
/// between reads.
pub struct ProcessTarget {
    pid: libc::pid_t,
    width: Width,
    byte_order: ByteOrder,
    type_table: TypeTable,
}

impl ProcessTarget {
    pub fn new(
        pid: libc::pid_t,
        width: Width,
        byte_order: ByteOrder,
        type_table: TypeTable,
    ) -> ProcessTarget {
        ProcessTarget {
            pid,
            width,
            byte_order,
            type_table,
        }
    }
}

impl Target for ProcessTarget {
    fn read_memory(&self, address: u64, size: usize) -> Result<Vec<u8>, MemoryAccessError> {
        let mut buffer = vec![0u8; size];
        if size == 0 {
            return Ok(buffer);
        }

        let local_iov = libc::iovec {
            iov_base: buffer.as_mut_ptr() as *mut libc::c_void,
            iov_len: size,
        };
        let remote_iov = libc::iovec {
            iov_base: address as usize as *mut libc::c_void,
            iov_len: size,
        };

        let read = unsafe { libc::process_vm_readv(self.pid, &local_iov, 1, &remote_iov, 1, 0) };

        if read < 0 {
            let err = std::io::Error::last_os_error();
            let reason = if err.raw_os_error() == Some(libc::EFAULT) {
                "bad address".to_owned()
            } else {
                format!("process_vm_readv failed: {}", err)
            };

            return Err(MemoryAccessError::new(address, size, reason));
        }

        if read as usize != size {
            return Err(MemoryAccessError::new(
                address,
                size,
                format!("unexpected end of mapping after {} bytes", read),
            ));
        }

        Ok(buffer)
    }

    fn resolve_type_name(&self, address: u64) -> Option<String> {
        self.type_table.name_of(address).map(str::to_owned)
    }

    fn architecture_width(&self) -> Width {
        self.width
    }

    fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }
}
