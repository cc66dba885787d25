//! Certificate serial numbers.
//!
//! Every certificate gets a fresh 128-bit probable prime. Uniqueness is
//! statistical; nothing here remembers serials that were already handed out.

use der::{Decode, Encode};
use der::asn1::AnyRef;
use num_bigint_dig::{BigUint, RandPrime};
use x509_cert::serial_number::SerialNumber;

use crate::error::Result;

/// Bit length of generated serial numbers.
pub const SERIAL_BITS: usize = 128;

/// Generates a random 128-bit probable prime serial number.
pub fn generate_serial() -> Result<SerialNumber> {
    let mut rng = rand_core::OsRng;
    let prime: BigUint = rng.gen_prime(SERIAL_BITS);
    Ok(SerialNumber::new(&prime.to_bytes_be())?)
}

/// The serial number as an unsigned big-endian integer.
pub fn serial_to_biguint(serial: &SerialNumber) -> Result<BigUint> {
    let der = serial.to_der()?;
    let any = AnyRef::from_der(&der)?;
    Ok(BigUint::from_bytes_be(any.value()))
}

/// The serial number in decimal.
pub fn serial_to_decimal(serial: &SerialNumber) -> Result<String> {
    Ok(serial_to_biguint(serial)?.to_str_radix(10))
}
