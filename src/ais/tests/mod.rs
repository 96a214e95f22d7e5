mod armor;
mod encoder;
mod roundtrip;
