mod installation;
mod releases;
