//! Platform trust-store verifier

use std::path::Path;

use crate::verifier::ensure_file;
use crate::{CertificateInfo, Result, SignError, SignatureVerifier};

/// Verifier backed by the operating system's trust store.
///
/// On Windows this is Authenticode verification through `WinVerifyTrust`
/// (generic verify v2 action). Other platforms have no Authenticode trust
/// store, so every file reports as unsigned there.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlatformVerifier;

impl PlatformVerifier {
    pub fn new() -> Self {
        Self
    }
}

impl SignatureVerifier for PlatformVerifier {
    fn verify_trust(&self, path: &Path) -> Result<bool> {
        ensure_file(path)?;

        #[cfg(windows)]
        {
            let trusted = wintrust::verify_file(path);
            tracing::debug!(path = %path.display(), trusted, "WinVerifyTrust result");
            Ok(trusted)
        }

        #[cfg(not(windows))]
        {
            tracing::debug!(
                path = %path.display(),
                "no platform trust store on this target, reporting unsigned"
            );
            Ok(false)
        }
    }

    /// Signer-chain extraction (`CryptQueryObject` on Windows) is not
    /// wired up; every platform reports [`SignError::Unsupported`].
    fn describe_certificate(&self, path: &Path) -> Result<CertificateInfo> {
        ensure_file(path)?;

        Err(SignError::Unsupported(
            "signer-chain extraction is not implemented for this platform",
        ))
    }
}

#[cfg(windows)]
mod wintrust {
    use std::ffi::c_void;
    use std::os::windows::ffi::OsStrExt;
    use std::path::Path;

    use windows_sys::Win32::Foundation::INVALID_HANDLE_VALUE;
    use windows_sys::Win32::Security::WinTrust::{
        WinVerifyTrust, WINTRUST_ACTION_GENERIC_VERIFY_V2, WINTRUST_DATA, WINTRUST_DATA_0,
        WINTRUST_FILE_INFO, WTD_CHOICE_FILE, WTD_REVOKE_NONE, WTD_STATEACTION_CLOSE,
        WTD_STATEACTION_VERIFY, WTD_UI_NONE,
    };

    /// Full-chain Authenticode verification. Returns true only when
    /// `WinVerifyTrust` reports the signature valid and trusted.
    pub(super) fn verify_file(path: &Path) -> bool {
        let wide_path: Vec<u16> = path
            .as_os_str()
            .encode_wide()
            .chain(std::iter::once(0))
            .collect();

        let file_info = WINTRUST_FILE_INFO {
            cbStruct: std::mem::size_of::<WINTRUST_FILE_INFO>() as u32,
            pcwszFilePath: wide_path.as_ptr(),
            hFile: std::ptr::null_mut(),
            pgKnownSubject: std::ptr::null_mut(),
        };

        let mut data = WINTRUST_DATA {
            cbStruct: std::mem::size_of::<WINTRUST_DATA>() as u32,
            pPolicyCallbackData: std::ptr::null_mut(),
            pSIPClientData: std::ptr::null_mut(),
            dwUIChoice: WTD_UI_NONE,
            fdwRevocationChecks: WTD_REVOKE_NONE,
            dwUnionChoice: WTD_CHOICE_FILE,
            Anonymous: WINTRUST_DATA_0 {
                pFile: &file_info as *const WINTRUST_FILE_INFO as *mut WINTRUST_FILE_INFO,
            },
            dwStateAction: WTD_STATEACTION_VERIFY,
            hWVTStateData: std::ptr::null_mut(),
            pwszURLReference: std::ptr::null_mut(),
            dwProvFlags: 0,
            dwUIContext: 0,
            pSignatureSettings: std::ptr::null_mut(),
        };

        let mut action = WINTRUST_ACTION_GENERIC_VERIFY_V2;
        let status = unsafe {
            WinVerifyTrust(
                INVALID_HANDLE_VALUE,
                &mut action,
                &mut data as *mut WINTRUST_DATA as *mut c_void,
            )
        };

        // Release verifier state regardless of the verdict.
        data.dwStateAction = WTD_STATEACTION_CLOSE;
        unsafe {
            WinVerifyTrust(
                INVALID_HANDLE_VALUE,
                &mut action,
                &mut data as *mut WINTRUST_DATA as *mut c_void,
            );
        }

        status == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_verify_trust_contract_violations() {
        let verifier = PlatformVerifier::new();
        assert!(matches!(
            verifier.verify_trust(Path::new("")),
            Err(SignError::EmptyPath)
        ));
        assert!(matches!(
            verifier.verify_trust(Path::new("/nonexistent/vetrun.bin")),
            Err(SignError::FileNotFound(_))
        ));
    }

    #[cfg(not(windows))]
    #[test]
    fn test_unsigned_on_platforms_without_trust_store() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"#!/bin/sh\nexit 0\n").unwrap();
        let verifier = PlatformVerifier::new();
        assert_eq!(verifier.verify_trust(file.path()).unwrap(), false);
    }

    #[test]
    fn test_describe_certificate_unsupported() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"payload").unwrap();
        let verifier = PlatformVerifier::new();
        assert!(matches!(
            verifier.describe_certificate(file.path()),
            Err(SignError::Unsupported(_))
        ));
    }
}
