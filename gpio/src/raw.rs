//! GPIO driver poking the Raspberry Pi GPIO registers through a memory mapping.
//!
//! Fastest of the backends, which matters for the enable strobe. Needs access to `/dev/gpiomem`
//! (or `/dev/mem` as root).
use crate::{check_claim, GpioBusOutput, GpioDriver, GpioError, GpioOutput, GpioResult};
use bitvec::vec::BitVec;
use log::debug;
use memmap2::{MmapOptions, MmapRaw};
use std::fmt::{Debug, Formatter};
use std::fs::OpenOptions;
use std::sync::atomic::AtomicU8;

/// Function select value of an output pin in GPFSELn.
const FUNCTION_OUTPUT: u32 = 0b001;
/// Function select value of an input pin, the safe state pins are returned to.
const FUNCTION_INPUT: u32 = 0b000;

const GPSET0: usize = 0x1c / 4;
const GPCLR0: usize = 0x28 / 4;

pub struct RawGpioDriver {
    mmap: MmapRaw,
    used_pins: BitVec<AtomicU8>,
}

impl RawGpioDriver {
    /// Physical base of the GPIO block. Ignored by `/dev/gpiomem`, which maps the block itself.
    const GPIO_BASE: u32 = 0x3F200000;

    const PIN_COUNT: usize = 58;

    fn create(path: &str, offset: u64) -> GpioResult<Self> {
        let file = OpenOptions::new().read(true).write(true).open(path)?;

        let mmap = MmapOptions::new()
            .offset(offset)
            .len(4096)
            .map_raw(&file)?;

        debug!("Mapped GPIO registers from {}", path);

        Ok(RawGpioDriver {
            mmap,
            used_pins: BitVec::repeat(false, Self::PIN_COUNT),
        })
    }

    pub fn new_gpiomem() -> GpioResult<Self> {
        Self::create("/dev/gpiomem", 0)
    }

    pub fn new_mem() -> GpioResult<Self> {
        Self::create("/dev/mem", Self::GPIO_BASE as u64)
    }

    fn register(&self, index: usize) -> *mut u32 {
        let base = self.mmap.as_mut_ptr() as *mut u32;
        // Every register used here is within the mapped 4 KiB page.
        unsafe { base.add(index) }
    }

    fn raw_set_pin_function(&self, pin_index: usize, function: u32) -> GpioResult<()> {
        if pin_index >= Self::PIN_COUNT {
            return Err(GpioError::InvalidArgument);
        }

        // GPFSELn register
        let register_ptr = self.register(pin_index / 10);
        let shift = (pin_index % 10) * 3;

        let mut register_value = unsafe { register_ptr.read_volatile() };
        register_value &= !(0b111 << shift);
        register_value |= function << shift;
        unsafe { register_ptr.write_volatile(register_value) };

        Ok(())
    }

    fn raw_set_pin_output(&self, pin_index: usize, high: bool) -> GpioResult<()> {
        if pin_index >= Self::PIN_COUNT {
            return Err(GpioError::InvalidArgument);
        }

        // GPSETn/GPCLRn register
        let register_ptr = self.register(if high { GPSET0 } else { GPCLR0 } + pin_index / 32);
        let shift = pin_index % 32;

        unsafe { register_ptr.write_volatile(1 << shift) };

        Ok(())
    }

    fn claim(&self, pin_index: usize) -> GpioResult<()> {
        self.raw_set_pin_output(pin_index, false)?;
        self.raw_set_pin_function(pin_index, FUNCTION_OUTPUT)?;
        self.used_pins.set_aliased(pin_index, true);
        Ok(())
    }

    fn release(&self, pin_index: usize) {
        _ = self.raw_set_pin_function(pin_index, FUNCTION_INPUT);
        self.used_pins.set_aliased(pin_index, false);
    }
}

impl Debug for RawGpioDriver {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "RawGpioDriver({:?})", self.mmap.as_ptr().addr())
    }
}

impl GpioDriver for RawGpioDriver {
    fn count(&self) -> GpioResult<usize> {
        Ok(Self::PIN_COUNT)
    }

    fn get_output(&self, index: usize) -> GpioResult<Box<dyn GpioOutput + '_>> {
        check_claim(&[index], self.count()?, |i| self.used_pins[i])?;
        self.claim(index)?;

        Ok(Box::new(RawGpioOutput {
            driver: self,
            pin_index: index,
        }))
    }

    fn get_output_bus<const N: usize>(
        &self,
        indices: [usize; N],
    ) -> GpioResult<Box<dyn GpioBusOutput<N> + '_>> {
        check_claim(&indices, self.count()?, |i| self.used_pins[i])?;

        // Build the bus first so already claimed pins are released if a later one fails.
        let mut bus = RawGpioBusOutput {
            driver: self,
            pin_indices: indices,
            claimed: 0,
        };
        for &index in &indices {
            self.claim(index)?;
            bus.claimed += 1;
        }

        Ok(Box::new(bus))
    }
}

struct RawGpioOutput<'a> {
    driver: &'a RawGpioDriver,
    pin_index: usize,
}

impl Debug for RawGpioOutput<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}[{}][output]", self.driver, self.pin_index)
    }
}

impl GpioOutput for RawGpioOutput<'_> {
    fn write(&self, value: bool) -> GpioResult<()> {
        self.driver.raw_set_pin_output(self.pin_index, value)
    }
}

impl Drop for RawGpioOutput<'_> {
    fn drop(&mut self) {
        self.driver.release(self.pin_index);
    }
}

struct RawGpioBusOutput<'a, const N: usize> {
    driver: &'a RawGpioDriver,
    pin_indices: [usize; N],
    claimed: usize,
}

impl<const N: usize> Debug for RawGpioBusOutput<'_, N> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}{:?}[output]", self.driver, self.pin_indices)
    }
}

impl<const N: usize> GpioBusOutput<N> for RawGpioBusOutput<'_, N> {
    fn write(&self, values: &[bool; N]) -> GpioResult<()> {
        for (&pin_index, &value) in self.pin_indices.iter().zip(values) {
            self.driver.raw_set_pin_output(pin_index, value)?;
        }
        Ok(())
    }
}

impl<const N: usize> Drop for RawGpioBusOutput<'_, N> {
    fn drop(&mut self) {
        for &pin_index in &self.pin_indices[..self.claimed] {
            self.driver.release(pin_index);
        }
    }
}
