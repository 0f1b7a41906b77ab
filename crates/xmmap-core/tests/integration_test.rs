//! Cross-process tests
//!
//! A shared mapping created before fork() is visible to both processes.

#[cfg(all(test, feature = "integration"))]
mod integration {
    use nix::sys::wait::{waitpid, WaitStatus};
    use nix::unistd::{fork, ForkResult};
    use std::io::{Read, Seek, SeekFrom, Write};
    use std::os::fd::AsRawFd;

    use xmmap_core::{MapFlags, ProtFlags, RegionConf};

    fn is_exit_success(status: WaitStatus) -> bool {
        matches!(status, WaitStatus::Exited(_, code) if code == 0)
    }

    /// Anonymous shared mapping written by the child, read by the parent
    #[test]
    fn test_anonymous_shared_across_fork() {
        let mut region = RegionConf::new()
            .len(4096)
            .flags(MapFlags::MAP_SHARED)
            .create()
            .unwrap();

        match unsafe { fork() }.unwrap() {
            ForkResult::Child => {
                let data = b"Hello from child!";
                region.as_mut_slice().unwrap()[..data.len()].copy_from_slice(data);
                std::process::exit(0);
            }
            ForkResult::Parent { child } => {
                let status = waitpid(child, None).unwrap();
                assert!(is_exit_success(status));

                let expected = b"Hello from child!";
                assert_eq!(&region.as_slice().unwrap()[..expected.len()], expected);
                region.teardown().unwrap();
            }
        }
    }

    /// Child tears down its inherited copy; the parent's mapping is unaffected
    #[test]
    fn test_child_teardown_is_independent() {
        let mut file = tempfile::tempfile().unwrap();
        file.write_all(b"parent data").unwrap();

        let mut region = RegionConf::new()
            .file(&file)
            .prot(ProtFlags::PROT_READ | ProtFlags::PROT_WRITE)
            .create()
            .unwrap();

        match unsafe { fork() }.unwrap() {
            ForkResult::Child => {
                region.as_mut_slice().unwrap()[..6].copy_from_slice(b"CHILD ");
                let code = if region.teardown().is_ok() { 0 } else { 1 };
                std::process::exit(code);
            }
            ForkResult::Parent { child } => {
                let status = waitpid(child, None).unwrap();
                assert!(is_exit_success(status));

                assert!(!region.is_released());
                assert_eq!(region.as_slice().unwrap(), b"CHILD  data");
                region.teardown().unwrap();

                let mut contents = String::new();
                file.seek(SeekFrom::Start(0)).unwrap();
                file.read_to_string(&mut contents).unwrap();
                assert_eq!(contents, "CHILD  data");
                assert!(file.as_raw_fd() >= 0);
            }
        }
    }
}
