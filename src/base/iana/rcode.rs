//! DNS response codes.

//------------ Rcode ---------------------------------------------------------

int_enum! {
    /// DNS Response Codes.
    ///
    /// The response code of a response indicates what happend on the server
    /// when trying to answer the query. Only the four bit header value is
    /// covered here; extended codes need the OPT record.
    ///
    /// [RFC 1035]: https://tools.ietf.org/html/rfc1035
    =>
    Rcode, u8, "RCODE";

    /// No error condition (0).
    (NOERROR => 0, "NOERROR")

    /// Format error (1).
    ///
    /// The name server was unable to interpret the query.
    (FORMERR => 1, "FORMERR")

    /// Server failure (2).
    (SERVFAIL => 2, "SERVFAIL")

    /// Name error (3).
    ///
    /// The domain name given in the query does not exist.
    (NXDOMAIN => 3, "NXDOMAIN")

    /// Not implemented (4).
    (NOTIMP => 4, "NOTIMP")

    /// Query refused (5).
    (REFUSED => 5, "REFUSED")
}
