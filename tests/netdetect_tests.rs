use gateway_probe::netdetect::{guess_gateway, guess_gateway_str, ipv4_to_default_cidr};
use std::net::Ipv4Addr;

#[test]
fn default_cidr_is_24() {
    let cidr = ipv4_to_default_cidr(Ipv4Addr::new(192, 168, 42, 99));
    assert_eq!(cidr.to_string(), "192.168.42.0/24");
}

#[test]
fn gateway_guess_for_home_lan() {
    assert_eq!(
        guess_gateway(Ipv4Addr::new(192, 168, 1, 42)),
        Ipv4Addr::new(192, 168, 1, 1)
    );
    assert_eq!(
        guess_gateway_str("192.168.1.42").expect("valid ip"),
        Ipv4Addr::new(192, 168, 1, 1)
    );
}

#[test]
fn gateway_guess_rejects_garbage() {
    let err = guess_gateway_str("not-an-ip").unwrap_err();
    assert!(err.to_string().contains("invalid local IP format"));
}
