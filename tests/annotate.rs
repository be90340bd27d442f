use inet_endpoint::{
	annotate::{Annotated, DetailLevel, Indent},
	Address,
};
use std::io::{self, Write};
use test_log::test;

struct Listener {
	name: &'static str,
	addresses: Vec<Address>,
}

fn describe<W: Write>(out: &mut Annotated<W>, listeners: &[Listener]) -> io::Result<()> {
	let verbose = DetailLevel::current(out) > 0;

	for listener in listeners {
		out.write_indent()?;
		writeln!(out, "{}:", listener.name)?;

		let mut out = Indent::new(out, 1);

		for address in &listener.addresses {
			out.write_indent()?;
			write!(out, "{address}")?;

			if verbose {
				write!(out, " ({}, {} bytes)", address.family(), address.size())?;
			}

			writeln!(out)?;
		}
	}

	Ok(())
}

fn listeners() -> Vec<Listener> {
	vec![
		Listener {
			name: "http",
			addresses: vec![
				"0.0.0.0:80".parse().unwrap(),
				"[::]:80".parse().unwrap(),
			],
		},
		Listener {
			name: "dns",
			addresses: vec![Address::parse("127.0.0.1", 53).unwrap()],
		},
	]
}

#[test]
fn nested_indentation() {
	let mut out = Annotated::new(Vec::new());

	{
		let mut out = DetailLevel::new(&mut out, 0);
		writeln!(out, "listeners:").unwrap();
		let mut out = Indent::new(&mut out, 1);
		describe(&mut out, &listeners()).unwrap();
	}

	assert_eq!(
		String::from_utf8(out.into_inner()).unwrap(),
		"listeners:\n    http:\n        0.0.0.0:80\n        [::]:80\n    dns:\n        127.0.0.1:53\n",
	);
}

#[test]
fn detail_level_changes_output() {
	let mut out = Annotated::new(Vec::new());

	{
		let mut out = DetailLevel::new(&mut out, 1);
		describe(&mut out, &listeners()[1..]).unwrap();
	}

	let text = String::from_utf8(out.into_inner()).unwrap();
	assert!(text.starts_with("dns:\n    127.0.0.1:53 (IPv4, "), "{text}");
	assert_eq!(text.lines().count(), 2);
}
