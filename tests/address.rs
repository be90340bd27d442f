use assert_matches::assert_matches;
use inet_endpoint::{
	errors::{InvalidAddressError, ParseNumberError},
	Address,
	AddressFamily,
};
use socket2::{Socket, Type};
use std::{
	io,
	net::{TcpStream, UdpSocket},
	str::FromStr,
};
use test_log::test;

#[test]
fn bind_and_connect_loopback() {
	let listen_addr = Address::loopback(AddressFamily::Ipv4, 0).unwrap();
	let sock_addr = listen_addr.to_sock_addr().unwrap();

	let listener = Socket::new(sock_addr.domain(), Type::STREAM, None).unwrap();
	listener.bind(&sock_addr).unwrap();
	listener.listen(1).unwrap();

	let bound = Address::try_from(&listener.local_addr().unwrap()).unwrap();
	assert!(bound.is_loopback());
	assert_ne!(bound.port(), 0);

	// The text form is good enough to connect to.
	let connect_to = std::net::SocketAddr::try_from(Address::from_str(&bound.to_text()).unwrap()).unwrap();
	let client = TcpStream::connect(connect_to).unwrap();
	let (accepted, peer) = listener.accept().unwrap();

	assert_eq!(
		Address::from_sock_addr(Some(&peer)).unwrap(),
		Address::from(client.local_addr().unwrap()),
	);

	drop(accepted);
}

#[test]
fn udp_socket_address_round_trip() {
	let socket = UdpSocket::bind("127.0.0.1:0").unwrap();
	let local = Address::from(socket.local_addr().unwrap());

	let mut reparsed = Address::default();
	reparsed.set_address(&local.to_string(), 0).unwrap();

	assert_eq!(reparsed, local);
	assert_eq!(reparsed.size(), socket2::SockAddr::from(socket.local_addr().unwrap()).len() as usize);
}

#[test]
fn errors_convert_to_io_errors() {
	let error: io::Error = Address::from_str("1.2.3.4:bogus").unwrap_err().into();
	assert_eq!(error.kind(), io::ErrorKind::InvalidInput);

	let error: io::Error = Address::with_raw_family(-1).unwrap_err().into();
	assert_eq!(error.kind(), io::ErrorKind::Unsupported);

	let error: io::Error = Address::default().set_port(1).unwrap_err().into();
	assert_eq!(error.kind(), io::ErrorKind::InvalidInput);
}

#[test]
fn port_errors_keep_their_cause() {
	let error = Address::from_str("1.2.3.4:99999999999").unwrap_err();
	assert_eq!(error.input(), "1.2.3.4:99999999999");

	let InvalidAddressError::InvalidPort { error: cause, .. } = &error else {
		panic!("unexpected error: {error:?}");
	};
	assert_matches!(cause, ParseNumberError::OutOfRange { .. });

	let source = std::error::Error::source(&error).unwrap();
	assert_eq!(source.to_string(), cause.to_string());
}

#[test]
fn mapped_display() {
	let addr = Address::parse("10.0.0.1", 53).unwrap().map_4to6().unwrap();
	assert_eq!(addr.to_string(), "[::ffff:10.0.0.1]:53");
}

#[cfg(feature = "clap")]
#[test]
fn clap_value_parser() {
	let command = || clap::Command::new("test").arg(
		clap::Arg::new("listen")
		.long("listen")
		.value_parser(Address::value_parser(8080))
	);

	let matches = command().try_get_matches_from(["test", "--listen", "[::1]"]).unwrap();
	assert_eq!(matches.get_one::<Address>("listen").unwrap().to_string(), "[::1]:8080");

	let matches = command().try_get_matches_from(["test", "--listen", "10.0.0.1:53"]).unwrap();
	assert_eq!(matches.get_one::<Address>("listen").unwrap().port(), 53);

	assert!(command().try_get_matches_from(["test", "--listen", "[::1"]).is_err());
}
