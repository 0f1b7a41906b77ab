//! Python bindings for xmmap

use pyo3::exceptions::{PyOSError, PyTypeError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::PyBytes;
use xmmap_core::{page_size, Error, Fd, MapFlags, ProtFlags, Region};

const DEFAULT_FLAGS: i32 = MapFlags::MAP_SHARED.bits();
const DEFAULT_PROT: i32 = ProtFlags::PROT_READ.bits() | ProtFlags::PROT_WRITE.bits();

/// Convert xmmap error to Python exception
fn to_py_err(e: Error) -> PyErr {
    match &e {
        Error::InvalidArgument(msg) => PyValueError::new_err(*msg),
        Error::Os { source, .. } => PyOSError::new_err((*source as i32, source.desc())),
        Error::Released => PyValueError::new_err(e.to_string()),
        Error::ReadOnly | Error::NotReadable => PyTypeError::new_err(e.to_string()),
    }
}

/// Python wrapper for Region
///
/// `close()` may be called any number of times; the region is also torn down
/// when the object is collected.
// TODO: refuse close() while buffer exports are outstanding once the type implements the buffer protocol
#[pyclass(unsendable, subclass, name = "mmap", module = "xmmap")]
struct Mmap {
    inner: Region,
}

impl Mmap {
    fn live(&self) -> PyResult<&Region> {
        if self.inner.is_released() {
            return Err(to_py_err(Error::Released));
        }
        Ok(&self.inner)
    }
}

#[pymethods]
impl Mmap {
    #[new]
    #[pyo3(signature = (fileno, length, flags = DEFAULT_FLAGS, prot = DEFAULT_PROT, offset = 0))]
    fn new(fileno: i32, length: isize, flags: i32, prot: i32, offset: i64) -> PyResult<Self> {
        let length = usize::try_from(length)
            .map_err(|_| PyValueError::new_err("memory mapped length must be positive"))?;
        let inner = Region::create(
            Fd::from_raw(fileno),
            length,
            MapFlags::from_bits_retain(flags),
            ProtFlags::from_bits_retain(prot),
            offset,
        )
        .map_err(to_py_err)?;
        Ok(Self { inner })
    }

    fn close(&mut self) -> PyResult<()> {
        self.inner.teardown().map_err(to_py_err)
    }

    #[getter]
    fn closed(&self) -> bool {
        self.inner.is_released()
    }

    #[getter]
    fn readable(&self) -> bool {
        self.inner.permissions().readable
    }

    #[getter]
    fn writable(&self) -> bool {
        self.inner.permissions().writable
    }

    #[getter]
    fn copy_on_write(&self) -> bool {
        self.inner.permissions().copy_on_write
    }

    fn __len__(&self) -> PyResult<usize> {
        Ok(self.live()?.len())
    }

    /// Copy the mapped bytes into a new bytes object
    fn tobytes<'py>(&self, py: Python<'py>) -> PyResult<&'py PyBytes> {
        let data = self.live()?.as_slice().map_err(to_py_err)?;
        Ok(PyBytes::new(py, data))
    }

    fn __enter__(slf: PyRef<'_, Self>) -> PyResult<PyRef<'_, Self>> {
        slf.live()?;
        Ok(slf)
    }

    fn __exit__(
        &mut self,
        _exc_type: &PyAny,
        _exc_value: &PyAny,
        _traceback: &PyAny,
    ) -> PyResult<bool> {
        self.close()?;
        Ok(false)
    }

    fn __repr__(&self) -> String {
        if self.inner.is_released() {
            return "<xmmap.mmap closed=True>".to_string();
        }
        let perms = self.inner.permissions();
        format!(
            "<xmmap.mmap closed=False, length={}, readable={}, writable={}, copy_on_write={}>",
            self.inner.len(),
            perms.readable,
            perms.writable,
            perms.copy_on_write,
        )
    }
}

#[pymodule]
fn xmmap(_py: Python, m: &PyModule) -> PyResult<()> {
    m.add("PAGESIZE", page_size().map_err(to_py_err)?)?;
    m.add("PROT_EXEC", ProtFlags::PROT_EXEC.bits())?;
    m.add("PROT_READ", ProtFlags::PROT_READ.bits())?;
    m.add("PROT_WRITE", ProtFlags::PROT_WRITE.bits())?;
    m.add("MAP_SHARED", MapFlags::MAP_SHARED.bits())?;
    m.add("MAP_PRIVATE", MapFlags::MAP_PRIVATE.bits())?;
    m.add_class::<Mmap>()?;
    Ok(())
}
