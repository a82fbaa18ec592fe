//! C FFI bindings for the parts of the mach host interface we need. See
//! [`host_info.h`](https://opensource.apple.com/source/xnu/xnu-4570.1.46/osfmk/mach/host_info.h)
//! and [`machine.h`](https://opensource.apple.com/source/xnu/xnu-4570.1.46/osfmk/mach/machine.h).

use std::mem::size_of;

use libc::{c_int, c_uint};
use mach2::{kern_return::kern_return_t, message::mach_msg_type_number_t, port::mach_port_t};

#[expect(non_camel_case_types)]
pub type host_t = mach_port_t;

#[expect(non_camel_case_types)]
pub type host_flavor_t = c_int;

#[expect(non_camel_case_types)]
pub type integer_t = c_int;

pub const HOST_CPU_LOAD_INFO: host_flavor_t = 3;

pub const CPU_STATE_USER: usize = 0;
pub const CPU_STATE_SYSTEM: usize = 1;
pub const CPU_STATE_IDLE: usize = 2;
pub const CPU_STATE_NICE: usize = 3;
pub const CPU_STATE_MAX: usize = 4;

#[expect(non_camel_case_types)]
#[repr(C)]
#[derive(Clone, Copy, Debug, Default)]
pub struct host_cpu_load_info {
    pub cpu_ticks: [c_uint; CPU_STATE_MAX],
}

pub const HOST_CPU_LOAD_INFO_COUNT: mach_msg_type_number_t =
    (size_of::<host_cpu_load_info>() / size_of::<integer_t>()) as _;

// SAFETY: Bindings like this are inherently unsafe. See the headers above for details.
extern "C" {
    pub fn mach_host_self() -> host_t;

    pub fn host_statistics(
        host_priv: host_t, flavor: host_flavor_t, host_info_out: *mut integer_t,
        host_info_out_cnt: *mut mach_msg_type_number_t,
    ) -> kern_return_t;
}

#[cfg(test)]
mod test {
    use std::mem;

    use super::*;

    #[test]
    fn struct_sizes() {
        assert_eq!(mem::size_of::<host_cpu_load_info>(), 16);
        assert_eq!(HOST_CPU_LOAD_INFO_COUNT, 4);
    }
}
