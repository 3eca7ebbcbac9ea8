mod client_ip;
mod logging;
