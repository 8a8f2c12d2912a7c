mod fixtures;
mod test_extraction;
mod test_transport;
