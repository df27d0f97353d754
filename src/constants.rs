// src/constants.rs

pub const DEFAULT_CONTROL_PORT: u16 = 9999;
pub const DEFAULT_DATA_PORT: u16 = 8888;
pub const DEFAULT_BANNER: &str = "Welcome to use FTP server!";

pub const WELCOME_REPLY: &str = "welcome to use";
pub const UNKNOWN_COMMAND_REPLY: &str = "cannot parse command, please enter correct command";
pub const QUIT_REPLY: &str = "Quit success!";

pub const PASV_FAILED_REPLY: &str = "fail to convert to pasv mode, please retry";
pub const PORT_SUCCESS_REPLY: &str = "convert port pattern success";
pub const PORT_INVALID_REPLY: &str = "fail to convert to port pattern, invalid argument";
pub const PORT_CONNECT_FAILED_REPLY: &str =
    "fail to connect to port pattern, connect to client error";

pub const LIST_FAILED_REPLY: &str = "fail to parse LIST command, please check argument";
pub const SIZE_UNAVAILABLE_REPLY: &str = "-1";

pub const RETR_READY_REPLY: &str = "retr parse success";
pub const RETR_STAT_FAILED_REPLY: &str = "RETR error, please check argument";
pub const RETR_OPEN_FAILED_REPLY: &str = "RETR error, cannot open file";
pub const RETR_NO_DATA_REPLY: &str = "RETR error, no data connection";

pub const STOR_READY_REPLY: &str = "recv command success, start store file";
